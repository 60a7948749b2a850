mod alignment;
mod gesture_state;
mod motion;
mod report;
mod scalar_series;

pub use alignment::AlignmentResult;
pub use gesture_state::GestureState;
pub use motion::MotionData;
pub use report::{
    ChannelStats, Extrema, SessionReport, SessionSummary, SimilarityMetric, SimilarityReport,
};
pub use scalar_series::{Provenance, ScalarSeries};
