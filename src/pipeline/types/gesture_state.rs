use serde::{Deserialize, Serialize};

/// Per-sample gesture classification. Variant order is the "openness" order used for
/// comparisons: `Closed < Undetermined < Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GestureState {
    Closed,
    Undetermined,
    Open,
}

impl GestureState {
    pub fn is_confirmed(&self) -> bool {
        !matches!(self, GestureState::Undetermined)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureState::Closed => "closed",
            GestureState::Undetermined => "undetermined",
            GestureState::Open => "open",
        }
    }
}
