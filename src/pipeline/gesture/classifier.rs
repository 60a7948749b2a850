use serde::{Deserialize, Serialize};

use crate::error::GestureError;
use crate::pipeline::types::GestureState;

/// Finger tapping, thumb-index distance over middle-MCP-wrist length: closed at or below.
pub const TAP_CLOSED_RATIO: f64 = 0.5;
/// Finger tapping: open at or above. The band in between absorbs landmark jitter.
pub const TAP_OPEN_RATIO: f64 = 0.8;
/// Fist cycles, index-tip-wrist distance over middle-MCP-wrist length: curled at or below.
pub const FIST_CLOSED_RATIO: f64 = 1.1;
/// Fist cycles: extended fingers reach roughly twice the palm length, open at or above.
pub const FIST_OPEN_RATIO: f64 = 1.5;
/// Sit-to-stand, thigh tilt from vertical in degrees: standing at or below (Closed).
pub const STANDING_MAX_DEGREES: f64 = 15.0;
/// Sit-to-stand: seated at or above (Open), so each rise from the chair is one cycle.
pub const SEATED_MIN_DEGREES: f64 = 45.0;

/// A validated `(low, high)` pair with `low < high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholds")]
pub struct Thresholds {
    low: f64,
    high: f64,
}

#[derive(Deserialize)]
struct RawThresholds {
    low: f64,
    high: f64,
}

impl TryFrom<RawThresholds> for Thresholds {
    type Error = GestureError;

    fn try_from(raw: RawThresholds) -> Result<Self, Self::Error> {
        Thresholds::new(raw.low, raw.high)
    }
}

impl Thresholds {
    pub fn new(low: f64, high: f64) -> Result<Self, GestureError> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(GestureError::InvalidThresholdConfiguration { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn finger_tapping() -> Self {
        Self {
            low: TAP_CLOSED_RATIO,
            high: TAP_OPEN_RATIO,
        }
    }

    pub fn fist_open_close() -> Self {
        Self {
            low: FIST_CLOSED_RATIO,
            high: FIST_OPEN_RATIO,
        }
    }

    pub fn sit_to_stand() -> Self {
        Self {
            low: STANDING_MAX_DEGREES,
            high: SEATED_MIN_DEGREES,
        }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn classify(&self, value: f64) -> GestureState {
        classify(value, self)
    }
}

/// `value <= low` is Closed, `value >= high` is Open, anything else (NaN included) is
/// Undetermined.
pub fn classify(value: f64, thresholds: &Thresholds) -> GestureState {
    if value <= thresholds.low {
        GestureState::Closed
    } else if value >= thresholds.high {
        GestureState::Open
    } else {
        GestureState::Undetermined
    }
}
