use serde::{Deserialize, Serialize};

use crate::common::SkeletonLayout;
use crate::pipeline::gesture::trigger::DEFAULT_ASPECT_RATIO;
use crate::pipeline::gesture::{Thresholds, TriggerKind};
use crate::pipeline::metrics::MetricChannel;

pub const DEFAULT_CAPTURE_SECONDS: f64 = 10.0;
pub const DEFAULT_NOMINAL_FPS: f64 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    #[default]
    FingerTapping,
    FistOpenClose,
    SitToStand,
}

impl ProtocolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolKind::FingerTapping => "finger_tapping",
            ProtocolKind::FistOpenClose => "fist_open_close",
            ProtocolKind::SitToStand => "sit_to_stand",
        }
    }

    /// File name prefix for recordings of this protocol.
    pub fn recording_prefix(&self) -> &'static str {
        match self {
            ProtocolKind::FingerTapping => "tap",
            ProtocolKind::FistOpenClose => "fist",
            ProtocolKind::SitToStand => "sts",
        }
    }
}

/// Everything a capture needs to know about the exercise being assessed.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureProtocol {
    pub kind: ProtocolKind,
    pub layout: SkeletonLayout,
    /// Drives the live tally and the post-hoc cycle count.
    pub channel: MetricChannel,
    pub thresholds: Thresholds,
    pub trigger: TriggerKind,
    pub capture_seconds: f64,
    pub nominal_fps: f64,
    /// Width over height of the camera image, used by triggers that measure in pixels.
    pub aspect_ratio: f64,
}

impl GestureProtocol {
    pub fn finger_tapping() -> Self {
        Self {
            kind: ProtocolKind::FingerTapping,
            layout: SkeletonLayout::Hand21,
            channel: MetricChannel::tap_amplitude(),
            thresholds: Thresholds::finger_tapping(),
            trigger: TriggerKind::OkGesture,
            capture_seconds: DEFAULT_CAPTURE_SECONDS,
            nominal_fps: DEFAULT_NOMINAL_FPS,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
        }
    }

    pub fn fist_open_close() -> Self {
        Self {
            kind: ProtocolKind::FistOpenClose,
            channel: MetricChannel::fist_amplitude(),
            thresholds: Thresholds::fist_open_close(),
            trigger: TriggerKind::OpenPalm,
            ..Self::finger_tapping()
        }
    }

    pub fn sit_to_stand() -> Self {
        Self {
            kind: ProtocolKind::SitToStand,
            layout: SkeletonLayout::Coco17,
            channel: MetricChannel::thigh_tilt(SkeletonLayout::Coco17),
            thresholds: Thresholds::sit_to_stand(),
            trigger: TriggerKind::Immediate,
            ..Self::finger_tapping()
        }
    }

    pub fn from_kind(kind: ProtocolKind) -> Self {
        match kind {
            ProtocolKind::FingerTapping => Self::finger_tapping(),
            ProtocolKind::FistOpenClose => Self::fist_open_close(),
            ProtocolKind::SitToStand => Self::sit_to_stand(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_capture_seconds(mut self, seconds: f64) -> Self {
        self.capture_seconds = seconds;
        self
    }

    pub fn with_nominal_fps(mut self, fps: f64) -> Self {
        self.nominal_fps = fps;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: f64) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Channels written to the motion artifact: the primary channel, plus the nose
    /// trajectory on body layouts.
    pub fn motion_channels(&self) -> Vec<MetricChannel> {
        let mut channels = vec![self.channel.clone()];
        if self.layout != SkeletonLayout::Hand21 {
            channels.extend(MetricChannel::nose_trajectory());
        }
        channels
    }
}

impl Default for GestureProtocol {
    fn default() -> Self {
        Self::finger_tapping()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_reference_landmarks_inside_their_layout() {
        for kind in [
            ProtocolKind::FingerTapping,
            ProtocolKind::FistOpenClose,
            ProtocolKind::SitToStand,
        ] {
            let protocol = GestureProtocol::from_kind(kind);
            for channel in protocol.motion_channels() {
                assert!(
                    channel.reduction.validate(protocol.layout).is_ok(),
                    "{} / {}",
                    kind.as_str(),
                    channel.name
                );
            }
        }
    }

    #[test]
    fn body_protocols_record_the_nose_trajectory() {
        let names: Vec<String> = GestureProtocol::sit_to_stand()
            .motion_channels()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            vec!["thigh_tilt", "nose_x", "nose_y", "velocity_magnitude"]
        );
        assert_eq!(GestureProtocol::finger_tapping().motion_channels().len(), 1);
    }

    #[test]
    fn kind_round_trips_through_snake_case() {
        let kind: ProtocolKind = serde_json::from_str("\"fist_open_close\"").unwrap();
        assert_eq!(kind, ProtocolKind::FistOpenClose);
        assert_eq!(kind.recording_prefix(), "fist");
    }
}
