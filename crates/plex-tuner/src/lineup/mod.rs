//! The lineup shaping pipeline: filters, scoring, shard/cap, and guide-number offset that
//! together implement `UpdateChannels`.

pub mod filters;
pub mod offset;
pub mod scoring;
pub mod shaper;
