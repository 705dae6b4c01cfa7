//! The XMLTV remap pipeline: streaming rewrite of an upstream guide to the locally exposed
//! lineup (`remap`), per-language/script text normalization (`normalize`), the dummy-guide
//! appender and placeholder document (`dummy`), and the TTL cache serving `/guide.xml`
//! (`cache`).

pub mod cache;
pub mod dummy;
pub mod normalize;
pub mod remap;

pub use cache::XmltvCache;
