use crate::common::{LandmarkFrame, LandmarkSequence};
use crate::error::{MetricError, SeriesError};
use crate::pipeline::metrics::reduction::MetricChannel;
use crate::pipeline::types::{Provenance, ScalarSeries};

/// Reduces landmark frames to one scalar channel. Live capture and post-capture analysis
/// both go through [`MetricExtractor::evaluate`], so a prefix of a recording always yields
/// the same values the full extraction does.
#[derive(Debug, Clone)]
pub struct MetricExtractor {
    channel: MetricChannel,
}

impl MetricExtractor {
    pub fn new(channel: MetricChannel) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &MetricChannel {
        &self.channel
    }

    pub fn provenance(&self) -> Provenance {
        Provenance::new(
            self.channel.reduction.kind(),
            self.channel.reduction.landmarks(),
        )
    }

    pub fn evaluate(
        &self,
        frame: &LandmarkFrame,
        previous: Option<&LandmarkFrame>,
        index: usize,
    ) -> Result<f64, MetricError> {
        self.channel.reduction.evaluate(frame, previous, index)
    }

    pub fn extract(&self, sequence: &LandmarkSequence) -> Result<ScalarSeries, MetricError> {
        if sequence.is_empty() {
            return Err(SeriesError::InsufficientSequenceLength {
                required: 1,
                actual: 0,
            }
            .into());
        }
        self.channel.reduction.validate(sequence.layout())?;

        let mut samples = Vec::with_capacity(sequence.len());
        let mut previous: Option<&LandmarkFrame> = None;
        for (index, frame) in sequence.frames().enumerate() {
            let frame = frame.ok_or(MetricError::TrackingLost { frame: index })?;
            samples.push((frame.timestamp, self.evaluate(frame, previous, index)?));
            previous = Some(frame);
        }

        Ok(ScalarSeries::from_samples(
            self.channel.name.clone(),
            self.provenance(),
            samples,
        ))
    }
}

/// Time derivative of a series against its own timestamps. One-sided differences at the
/// ends, centered differences inside.
pub fn speed(series: &ScalarSeries) -> Result<ScalarSeries, MetricError> {
    let n = series.len();
    if n < 2 {
        return Err(SeriesError::InsufficientSequenceLength {
            required: 2,
            actual: n,
        }
        .into());
    }
    let times = series.times();
    let values = series.values();
    if let Some(index) = (1..n).find(|&i| times[i] <= times[i - 1]) {
        return Err(MetricError::NonIncreasingTime { index });
    }

    let derivative = (0..n).map(|i| {
        let (lo, hi) = match i {
            0 => (0, 1),
            i if i == n - 1 => (n - 2, n - 1),
            i => (i - 1, i + 1),
        };
        (values[hi] - values[lo]) / (times[hi] - times[lo])
    });

    let provenance = Provenance::new(
        format!("d/dt {}", series.provenance().reduction),
        series.provenance().landmarks.clone(),
    );
    Ok(ScalarSeries::from_samples(
        format!("{}_speed", series.name()),
        provenance,
        times.iter().copied().zip(derivative),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::skeleton::hand;
    use crate::common::{Landmark, Observation, SequenceBuilder, SkeletonLayout};

    fn tap_frame(timestamp: f64, gap: f64) -> LandmarkFrame {
        let mut points = vec![Landmark::default(); 21];
        points[hand::WRIST] = Landmark::planar(0.5, 0.9);
        points[hand::MIDDLE_MCP] = Landmark::planar(0.5, 0.7);
        points[hand::THUMB_TIP] = Landmark::planar(0.3, 0.5);
        points[hand::INDEX_TIP] = Landmark::planar(0.3, 0.5 - gap);
        LandmarkFrame::new(timestamp, points)
    }

    fn sequence(gaps: &[f64]) -> LandmarkSequence {
        let mut builder = SequenceBuilder::new(SkeletonLayout::Hand21, 20.0);
        for (i, gap) in gaps.iter().enumerate() {
            builder
                .push(Observation::Detected(tap_frame(i as f64 * 0.05, *gap)))
                .unwrap();
        }
        builder.seal()
    }

    #[test]
    fn extract_keeps_length_and_provenance() {
        let extractor = MetricExtractor::new(MetricChannel::tap_amplitude());
        let series = extractor.extract(&sequence(&[0.2, 0.1, 0.02])).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.name(), "amplitude");
        assert_eq!(series.provenance().reduction, "distance_ratio");
        assert_eq!(series.provenance().landmarks, vec![4, 8, 9, 0]);
        let expected = [1.0, 0.5, 0.1];
        for (value, expected) in series.values().iter().zip(expected) {
            assert!((value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn extract_reports_missing_frame() {
        let mut builder = SequenceBuilder::new(SkeletonLayout::Hand21, 20.0);
        builder
            .push(Observation::Detected(tap_frame(0.0, 0.1)))
            .unwrap();
        builder
            .push(Observation::NoDetection { timestamp: 0.05 })
            .unwrap();
        let err = MetricExtractor::new(MetricChannel::tap_amplitude())
            .extract(&builder.seal())
            .unwrap_err();
        assert_eq!(err, MetricError::TrackingLost { frame: 1 });
    }

    #[test]
    fn extract_rejects_empty_sequence() {
        let empty = SequenceBuilder::new(SkeletonLayout::Hand21, 20.0).seal();
        let err = MetricExtractor::new(MetricChannel::tap_amplitude())
            .extract(&empty)
            .unwrap_err();
        assert!(matches!(
            err,
            MetricError::Series(SeriesError::InsufficientSequenceLength { required: 1, .. })
        ));
    }

    #[test]
    fn speed_uses_wall_clock_spacing() {
        let series = ScalarSeries::from_samples(
            "amplitude",
            Provenance::new("distance_ratio", vec![]),
            vec![(0.0, 0.0), (0.1, 1.0), (0.3, 3.0), (0.4, 2.0)],
        );
        let speed = speed(&series).unwrap();
        let expected = [10.0, 10.0, 1.0 / 0.3, -10.0];
        for (value, expected) in speed.values().iter().zip(expected) {
            assert!((value - expected).abs() < 1e-9, "{value} vs {expected}");
        }
        assert_eq!(speed.name(), "amplitude_speed");
        assert_eq!(speed.times(), series.times());
    }

    #[test]
    fn speed_needs_two_increasing_samples() {
        let single = ScalarSeries::uniform("a", vec![1.0], 20.0);
        assert!(matches!(
            speed(&single),
            Err(MetricError::Series(SeriesError::InsufficientSequenceLength { .. }))
        ));

        let stalled = ScalarSeries::from_samples(
            "a",
            Provenance::new("x", vec![]),
            vec![(0.0, 1.0), (0.0, 2.0)],
        );
        assert_eq!(speed(&stalled), Err(MetricError::NonIncreasingTime { index: 1 }));
    }
}
