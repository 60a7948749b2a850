use serde::{Deserialize, Serialize};

use crate::common::skeleton::SkeletonLayout;
use crate::error::{MetricError, SessionError};

/// One keypoint in normalized image coordinates. Persisted as an `[x, y, z]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Depth relative to the estimator's origin, 0.0 when the estimator is 2D only.
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn planar_distance(&self, other: &Landmark) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 3]> for Landmark {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Landmark> for [f64; 3] {
    fn from(landmark: Landmark) -> Self {
        [landmark.x, landmark.y, landmark.z]
    }
}

/// All keypoints the estimator reported for one timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    /// Seconds on the capture clock.
    pub timestamp: f64,
    points: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(timestamp: f64, points: Vec<Landmark>) -> Self {
        Self { timestamp, points }
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Result<&Landmark, MetricError> {
        self.points.get(index).ok_or(MetricError::LandmarkOutOfRange {
            index,
            cardinality: self.points.len(),
        })
    }
}

/// What the estimator produced for a single input frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Detected(LandmarkFrame),
    NoDetection { timestamp: f64 },
}

impl Observation {
    pub fn timestamp(&self) -> f64 {
        match self {
            Observation::Detected(frame) => frame.timestamp,
            Observation::NoDetection { timestamp } => *timestamp,
        }
    }

    pub fn frame(&self) -> Option<&LandmarkFrame> {
        match self {
            Observation::Detected(frame) => Some(frame),
            Observation::NoDetection { .. } => None,
        }
    }
}

/// Persisted form: one entry per frame, `null` where nothing was detected.
pub type PersistedSequence = Vec<Option<Vec<Landmark>>>;

/// A sealed, immutable recording. Built through [`SequenceBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSequence {
    layout: SkeletonLayout,
    sample_rate: f64,
    observations: Vec<Observation>,
}

impl LandmarkSequence {
    pub fn layout(&self) -> SkeletonLayout {
        self.layout
    }

    /// Nominal frames per second of the capture.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn frames(&self) -> impl Iterator<Item = Option<&LandmarkFrame>> {
        self.observations.iter().map(Observation::frame)
    }

    pub fn duration_seconds(&self) -> f64 {
        match (self.observations.first(), self.observations.last()) {
            (Some(first), Some(last)) => last.timestamp() - first.timestamp(),
            _ => 0.0,
        }
    }

    pub fn to_persisted(&self) -> PersistedSequence {
        self.frames()
            .map(|frame| frame.map(|f| f.points().to_vec()))
            .collect()
    }

    /// Rebuilds a sequence from its persisted form. Timestamps are nominal (`i / sample_rate`)
    /// since the format does not carry them.
    pub fn from_persisted(
        persisted: PersistedSequence,
        layout: SkeletonLayout,
        sample_rate: f64,
    ) -> Result<Self, SessionError> {
        let mut builder = SequenceBuilder::new(layout, sample_rate);
        for (index, points) in persisted.into_iter().enumerate() {
            let timestamp = index as f64 / sample_rate;
            let observation = match points {
                Some(points) => Observation::Detected(LandmarkFrame::new(timestamp, points)),
                None => Observation::NoDetection { timestamp },
            };
            builder.push(observation)?;
        }
        Ok(builder.seal())
    }
}

/// Growing landmark buffer owned by a single capture.
#[derive(Debug)]
pub struct SequenceBuilder {
    layout: SkeletonLayout,
    sample_rate: f64,
    observations: Vec<Observation>,
}

impl SequenceBuilder {
    pub fn new(layout: SkeletonLayout, sample_rate: f64) -> Self {
        Self {
            layout,
            sample_rate,
            observations: Vec::new(),
        }
    }

    pub fn push(&mut self, observation: Observation) -> Result<(), SessionError> {
        if let Observation::Detected(frame) = &observation {
            let expected = self.layout.cardinality();
            if frame.len() != expected {
                return Err(SessionError::CardinalityMismatch {
                    expected,
                    actual: frame.len(),
                });
            }
        }
        self.observations.push(observation);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn last_frame(&self) -> Option<&LandmarkFrame> {
        self.observations.last().and_then(Observation::frame)
    }

    pub fn seal(self) -> LandmarkSequence {
        LandmarkSequence {
            layout: self.layout,
            sample_rate: self.sample_rate,
            observations: self.observations,
        }
    }
}
