//! HDHomeRun discovery surface: `/discover.json`, `/lineup.json`, `/lineup_status.json`,
//! `/device.xml`, and the SSDP M-SEARCH responder that makes Plex auto-detect the tuner.

pub mod device_xml;
pub mod discover;
pub mod ssdp;

pub use device_xml::DeviceXml;
pub use discover::{DiscoverResponse, LineupEntry, LineupStatus};
