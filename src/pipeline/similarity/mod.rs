pub mod comparison;
pub mod dtw;
pub mod service;

pub use comparison::{channel_label, compare_channel, compare_motion, metric_name, shared_channels};
pub use dtw::{dtw, dtw_with, DtwOptions};
pub use service::{
    compare_against_references, BoxComparisonService, ComparisonRequest, ComparisonResponse,
    ComparisonService, ComparisonServiceBuilder,
};
