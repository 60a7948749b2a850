pub mod ndjson;
pub mod source;

pub use ndjson::{NdjsonSource, WireObservation};
pub use source::{ChannelSource, LandmarkSource, ReplaySource};
