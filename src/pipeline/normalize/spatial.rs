use crate::error::SeriesError;
use crate::pipeline::types::{MotionData, ScalarSeries};

/// Maps values onto [0, 1] using their own min and max. A constant channel maps to all
/// zeros.
pub fn normalize_unit_range(values: &[f64]) -> Result<Vec<f64>, SeriesError> {
    if values.is_empty() {
        return Err(SeriesError::InsufficientSequenceLength {
            required: 1,
            actual: 0,
        });
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range > 0.0 {
        Ok(values.iter().map(|v| (v - min) / range).collect())
    } else {
        Ok(vec![0.0; values.len()])
    }
}

pub fn normalize_series(series: &ScalarSeries) -> Result<ScalarSeries, SeriesError> {
    let values = normalize_unit_range(series.values())?;
    Ok(ScalarSeries::from_samples(
        series.name(),
        series.provenance().clone(),
        series.times().iter().copied().zip(values),
    ))
}

/// Normalizes every channel independently; frames are left untouched.
pub fn normalize_spatial(motion: &MotionData) -> Result<MotionData, SeriesError> {
    let mut normalized = MotionData {
        frames: motion.frames.clone(),
        ..MotionData::default()
    };
    for (name, values) in &motion.channels {
        normalized.insert(name.clone(), normalize_unit_range(values)?);
    }
    Ok(normalized)
}
