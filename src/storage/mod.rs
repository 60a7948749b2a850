pub mod sequence_store;

pub use sequence_store::{RecordingEntry, SequenceStore};
