use serde::Serialize;
use thiserror::Error;

use crate::error::MetricError;

/// `Idle -> Armed -> Recording -> {Completed, Aborted}`. Armed lasts for the triggering
/// frame only: the buffer is cleared and recording starts straight away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Idle,
    Armed,
    Recording,
    Completed,
    Aborted,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Completed | SessionPhase::Aborted)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbortReason {
    #[error("tracking lost at frame {frame}")]
    TrackingLost { frame: usize },
    #[error("frame could not be measured: {0}")]
    Unmeasurable(MetricError),
    #[error("cancelled")]
    Cancelled,
    #[error("nothing was recorded")]
    NothingRecorded,
}
