use serde::{Deserialize, Serialize};

use crate::common::skeleton::{coco, hand, pose};
use crate::common::{LandmarkFrame, SkeletonLayout};
use crate::error::MetricError;

/// Reference distances below this (normalized image units) cannot scale a measurement.
pub const MIN_REFERENCE_DISTANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Per-frame reduction of a landmark set to one scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reduction {
    /// Planar distance of the numerator pair divided by that of the reference pair.
    DistanceRatio {
        numerator: (usize, usize),
        reference: (usize, usize),
    },
    /// Tilt of the segment `from -> to` away from the image vertical, in degrees within
    /// [0, 90]. Mirrored poses give the same value.
    VerticalTilt { from: usize, to: usize },
    /// Raw coordinate of one landmark.
    Coordinate { landmark: usize, axis: Axis },
    /// Planar distance a landmark moved since the previous frame.
    Displacement { landmark: usize },
}

impl Reduction {
    pub fn kind(&self) -> &'static str {
        match self {
            Reduction::DistanceRatio { .. } => "distance_ratio",
            Reduction::VerticalTilt { .. } => "vertical_tilt",
            Reduction::Coordinate { .. } => "coordinate",
            Reduction::Displacement { .. } => "displacement",
        }
    }

    pub fn landmarks(&self) -> Vec<usize> {
        match *self {
            Reduction::DistanceRatio {
                numerator: (a, b),
                reference: (c, d),
            } => vec![a, b, c, d],
            Reduction::VerticalTilt { from, to } => vec![from, to],
            Reduction::Coordinate { landmark, .. } | Reduction::Displacement { landmark } => {
                vec![landmark]
            }
        }
    }

    /// Fails when any referenced landmark lies outside the layout.
    pub fn validate(&self, layout: SkeletonLayout) -> Result<(), MetricError> {
        let cardinality = layout.cardinality();
        match self.landmarks().into_iter().find(|&index| index >= cardinality) {
            Some(index) => Err(MetricError::LandmarkOutOfRange { index, cardinality }),
            None => Ok(()),
        }
    }

    pub fn evaluate(
        &self,
        frame: &LandmarkFrame,
        previous: Option<&LandmarkFrame>,
        index: usize,
    ) -> Result<f64, MetricError> {
        match *self {
            Reduction::DistanceRatio {
                numerator: (a, b),
                reference: (c, d),
            } => {
                let reference = frame.point(c)?.planar_distance(frame.point(d)?);
                if reference < MIN_REFERENCE_DISTANCE {
                    return Err(MetricError::DegenerateReference {
                        frame: index,
                        distance: reference,
                    });
                }
                Ok(frame.point(a)?.planar_distance(frame.point(b)?) / reference)
            }
            Reduction::VerticalTilt { from, to } => {
                let start = frame.point(from)?;
                let end = frame.point(to)?;
                let (dx, dy) = ((end.x - start.x).abs(), (end.y - start.y).abs());
                Ok(dx.atan2(dy).to_degrees())
            }
            Reduction::Coordinate { landmark, axis } => {
                let point = frame.point(landmark)?;
                Ok(match axis {
                    Axis::X => point.x,
                    Axis::Y => point.y,
                    Axis::Z => point.z,
                })
            }
            Reduction::Displacement { landmark } => match previous {
                Some(previous) => {
                    Ok(frame.point(landmark)?.planar_distance(previous.point(landmark)?))
                }
                None => Ok(0.0),
            },
        }
    }
}

/// A named reduction; the name becomes the channel name of the extracted series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricChannel {
    pub name: String,
    pub reduction: Reduction,
}

impl MetricChannel {
    pub fn new(name: impl Into<String>, reduction: Reduction) -> Self {
        Self {
            name: name.into(),
            reduction,
        }
    }

    /// Thumb tip to index tip, scaled by middle-finger MCP to wrist.
    pub fn tap_amplitude() -> Self {
        Self::new(
            "amplitude",
            Reduction::DistanceRatio {
                numerator: (hand::THUMB_TIP, hand::INDEX_TIP),
                reference: (hand::MIDDLE_MCP, hand::WRIST),
            },
        )
    }

    /// Index tip to wrist, scaled by middle-finger MCP to wrist.
    pub fn fist_amplitude() -> Self {
        Self::new(
            "amplitude",
            Reduction::DistanceRatio {
                numerator: (hand::INDEX_TIP, hand::WRIST),
                reference: (hand::MIDDLE_MCP, hand::WRIST),
            },
        )
    }

    /// Hip to knee tilt from vertical: near 0 standing, near 90 seated.
    pub fn thigh_tilt(layout: SkeletonLayout) -> Self {
        let (from, to) = match layout {
            SkeletonLayout::Pose33 => (pose::LEFT_HIP, pose::LEFT_KNEE),
            _ => (coco::LEFT_HIP, coco::LEFT_KNEE),
        };
        Self::new("thigh_tilt", Reduction::VerticalTilt { from, to })
    }

    /// Nose trajectory channels (`nose_x`, `nose_y`, `velocity_magnitude`).
    pub fn nose_trajectory() -> Vec<Self> {
        vec![
            Self::new(
                "nose_x",
                Reduction::Coordinate {
                    landmark: pose::NOSE,
                    axis: Axis::X,
                },
            ),
            Self::new(
                "nose_y",
                Reduction::Coordinate {
                    landmark: pose::NOSE,
                    axis: Axis::Y,
                },
            ),
            Self::new(
                "velocity_magnitude",
                Reduction::Displacement {
                    landmark: pose::NOSE,
                },
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Landmark;

    fn frame_with(points: &[(usize, f64, f64)], cardinality: usize) -> LandmarkFrame {
        let mut landmarks = vec![Landmark::default(); cardinality];
        for &(index, x, y) in points {
            landmarks[index] = Landmark::planar(x, y);
        }
        LandmarkFrame::new(0.0, landmarks)
    }

    #[test]
    fn distance_ratio_scales_by_reference() {
        let frame = frame_with(
            &[
                (hand::WRIST, 0.5, 0.9),
                (hand::MIDDLE_MCP, 0.5, 0.7),
                (hand::THUMB_TIP, 0.3, 0.5),
                (hand::INDEX_TIP, 0.3, 0.4),
            ],
            21,
        );
        let value = MetricChannel::tap_amplitude()
            .reduction
            .evaluate(&frame, None, 0)
            .unwrap();
        assert!((value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn degenerate_reference_is_an_error() {
        let frame = frame_with(
            &[
                (hand::WRIST, 0.5, 0.5),
                (hand::MIDDLE_MCP, 0.5, 0.5 + 5e-7),
                (hand::INDEX_TIP, 0.3, 0.4),
            ],
            21,
        );
        let err = MetricChannel::tap_amplitude()
            .reduction
            .evaluate(&frame, None, 7)
            .unwrap_err();
        assert!(matches!(err, MetricError::DegenerateReference { frame: 7, .. }));
    }

    #[test]
    fn vertical_tilt_ignores_facing_direction() {
        let upright = frame_with(&[(coco::LEFT_HIP, 0.5, 0.5), (coco::LEFT_KNEE, 0.5, 0.8)], 17);
        let tilt = MetricChannel::thigh_tilt(SkeletonLayout::Coco17)
            .reduction
            .evaluate(&upright, None, 0)
            .unwrap();
        assert!(tilt.abs() < 1e-9);

        let reduction = Reduction::VerticalTilt {
            from: coco::LEFT_HIP,
            to: coco::LEFT_KNEE,
        };
        let facing_right =
            frame_with(&[(coco::LEFT_HIP, 0.5, 0.5), (coco::LEFT_KNEE, 0.7, 0.52)], 17);
        let facing_left =
            frame_with(&[(coco::LEFT_HIP, 0.5, 0.5), (coco::LEFT_KNEE, 0.3, 0.52)], 17);
        let right = reduction.evaluate(&facing_right, None, 0).unwrap();
        let left = reduction.evaluate(&facing_left, None, 0).unwrap();
        assert!((right - left).abs() < 1e-9);
        assert!(right > 80.0 && right <= 90.0);

        let diagonal = frame_with(&[(coco::LEFT_HIP, 0.5, 0.5), (coco::LEFT_KNEE, 0.4, 0.4)], 17);
        let tilt = reduction.evaluate(&diagonal, None, 0).unwrap();
        assert!((tilt - 45.0).abs() < 1e-9);
    }

    #[test]
    fn displacement_starts_at_zero() {
        let reduction = Reduction::Displacement { landmark: 0 };
        let first = frame_with(&[(0, 0.1, 0.1)], 33);
        let second = frame_with(&[(0, 0.4, 0.5)], 33);
        assert_eq!(reduction.evaluate(&first, None, 0).unwrap(), 0.0);
        let moved = reduction.evaluate(&second, Some(&first), 1).unwrap();
        assert!((moved - 0.5).abs() < 1e-9);
    }

    #[test]
    fn validate_catches_out_of_range_landmarks() {
        let channel = MetricChannel::thigh_tilt(SkeletonLayout::Pose33);
        assert_eq!(
            channel.reduction.validate(SkeletonLayout::Hand21),
            Err(MetricError::LandmarkOutOfRange {
                index: pose::LEFT_HIP,
                cardinality: 21
            })
        );
        assert!(channel.reduction.validate(SkeletonLayout::Pose33).is_ok());
    }
}
