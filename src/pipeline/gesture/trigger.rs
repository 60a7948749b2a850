use serde::{Deserialize, Serialize};

use crate::common::skeleton::hand;
use crate::common::{Landmark, LandmarkFrame};

/// Thumb-index contact distance allowed for the "OK" sign, as a fraction of the mean
/// fingertip spacing.
pub const OK_CONTACT_RATIO: f64 = 0.4;
/// Width / height of the capture image; landmark x and y are normalized separately.
pub const DEFAULT_ASPECT_RATIO: f64 = 4.0 / 3.0;

/// Stateless per-frame predicate that arms a capture.
pub trait TriggerDetector: Send + Sync {
    fn is_triggered(&self, frame: &LandmarkFrame) -> bool;
    fn name(&self) -> &'static str;
}

/// Thumb tip touching index tip while middle, ring and pinky are extended.
#[derive(Debug, Clone)]
pub struct OkGestureTrigger {
    contact_ratio: f64,
    aspect_ratio: f64,
}

impl OkGestureTrigger {
    pub fn new() -> Self {
        Self {
            contact_ratio: OK_CONTACT_RATIO,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: f64) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_contact_ratio(mut self, contact_ratio: f64) -> Self {
        self.contact_ratio = contact_ratio;
        self
    }

    // Distance in image-height units so x and y weigh like pixels.
    fn image_distance(&self, a: &Landmark, b: &Landmark) -> f64 {
        ((a.x - b.x) * self.aspect_ratio).hypot(a.y - b.y)
    }
}

impl Default for OkGestureTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerDetector for OkGestureTrigger {
    fn is_triggered(&self, frame: &LandmarkFrame) -> bool {
        let points = frame.points();
        if points.len() <= hand::PINKY_TIP {
            return false;
        }
        let tips = [
            hand::THUMB_TIP,
            hand::INDEX_TIP,
            hand::MIDDLE_TIP,
            hand::RING_TIP,
            hand::PINKY_TIP,
        ];
        let spacing: f64 = tips[1..]
            .windows(2)
            .map(|pair| self.image_distance(&points[pair[0]], &points[pair[1]]))
            .sum::<f64>()
            / 3.0;
        let reference = if spacing > 0.0 { spacing } else { 1.0 };

        let contact = self.image_distance(&points[hand::THUMB_TIP], &points[hand::INDEX_TIP]);
        if contact > self.contact_ratio * reference {
            return false;
        }
        fingers_extended(points, &hand::FINGER_JOINTS[1..])
    }

    fn name(&self) -> &'static str {
        "ok_gesture"
    }
}

/// All four long fingers extended.
#[derive(Debug, Clone, Default)]
pub struct OpenPalmTrigger;

impl TriggerDetector for OpenPalmTrigger {
    fn is_triggered(&self, frame: &LandmarkFrame) -> bool {
        let points = frame.points();
        points.len() > hand::PINKY_TIP && fingers_extended(points, &hand::FINGER_JOINTS)
    }

    fn name(&self) -> &'static str {
        "open_palm"
    }
}

/// Arms on the first detected frame.
#[derive(Debug, Clone, Default)]
pub struct ImmediateTrigger;

impl TriggerDetector for ImmediateTrigger {
    fn is_triggered(&self, _frame: &LandmarkFrame) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "immediate"
    }
}

// Image y grows downwards: an extended finger has its tip above the PIP joint.
fn fingers_extended(points: &[Landmark], joints: &[(usize, usize)]) -> bool {
    joints.iter().all(|&(tip, pip)| points[tip].y < points[pip].y)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    OkGesture,
    OpenPalm,
    Immediate,
}

impl TriggerKind {
    pub fn build(&self, aspect_ratio: f64) -> Box<dyn TriggerDetector> {
        match self {
            TriggerKind::OkGesture => {
                Box::new(OkGestureTrigger::new().with_aspect_ratio(aspect_ratio))
            }
            TriggerKind::OpenPalm => Box::new(OpenPalmTrigger),
            TriggerKind::Immediate => Box::new(ImmediateTrigger),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Upright hand: fingertips at y = 0.3, PIP joints at y = 0.45, wrist at y = 0.9.
    pub(crate) fn open_hand() -> Vec<Landmark> {
        let mut points = vec![Landmark::planar(0.5, 0.6); 21];
        points[hand::WRIST] = Landmark::planar(0.5, 0.9);
        points[hand::MIDDLE_MCP] = Landmark::planar(0.5, 0.7);
        points[hand::THUMB_TIP] = Landmark::planar(0.30, 0.55);
        for (i, &(tip, pip)) in hand::FINGER_JOINTS.iter().enumerate() {
            let x = 0.40 + 0.06 * i as f64;
            points[tip] = Landmark::planar(x, 0.3);
            points[pip] = Landmark::planar(x, 0.45);
        }
        points
    }

    pub(crate) fn ok_hand() -> Vec<Landmark> {
        let mut points = open_hand();
        points[hand::THUMB_TIP] = Landmark::planar(0.41, 0.31);
        points
    }

    #[test]
    fn ok_gesture_needs_contact_and_extended_fingers() {
        let trigger = OkGestureTrigger::new();
        assert!(trigger.is_triggered(&LandmarkFrame::new(0.0, ok_hand())));
        assert!(!trigger.is_triggered(&LandmarkFrame::new(0.0, open_hand())));

        let mut curled = ok_hand();
        curled[hand::RING_TIP].y = 0.5;
        assert!(!trigger.is_triggered(&LandmarkFrame::new(0.0, curled)));
    }

    #[test]
    fn open_palm_requires_all_four_fingers() {
        assert!(OpenPalmTrigger.is_triggered(&LandmarkFrame::new(0.0, open_hand())));
        let mut fist = open_hand();
        fist[hand::INDEX_TIP].y = 0.5;
        assert!(!OpenPalmTrigger.is_triggered(&LandmarkFrame::new(0.0, fist)));
    }

    #[test]
    fn short_frames_never_trigger() {
        let frame = LandmarkFrame::new(0.0, vec![Landmark::default(); 5]);
        assert!(!OkGestureTrigger::new().is_triggered(&frame));
        assert!(!OpenPalmTrigger.is_triggered(&frame));
        assert!(ImmediateTrigger.is_triggered(&frame));
    }
}
