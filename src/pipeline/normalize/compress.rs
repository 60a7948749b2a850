use crate::error::SeriesError;
use crate::pipeline::normalize::resample::{resample_temporal, resample_values};
use crate::pipeline::normalize::spatial::{normalize_series, normalize_unit_range};
use crate::pipeline::types::{MotionData, ScalarSeries};

pub const DEFAULT_TARGET_LENGTH: usize = 100;

/// Spatially normalizes, then resamples, the selected channels of a fixed-rate motion
/// capture. Channels not listed are dropped.
pub fn compress_motion(
    motion: &MotionData,
    channels: &[String],
    target_length: usize,
) -> Result<MotionData, SeriesError> {
    let mut compressed = MotionData::with_frames(target_length);
    for name in channels {
        let values = motion
            .channel(name)
            .ok_or_else(|| SeriesError::MissingChannel(name.clone()))?;
        let normalized = normalize_unit_range(values)?;
        compressed.insert(name.clone(), resample_values(&normalized, target_length)?);
    }
    Ok(compressed)
}

/// Same pipeline for extracted series, which carry their own timestamps.
pub fn compress_series(
    series: &[ScalarSeries],
    target_length: usize,
) -> Result<MotionData, SeriesError> {
    let mut compressed = MotionData::with_frames(target_length);
    for s in series {
        let resampled = resample_temporal(&normalize_series(s)?, target_length)?;
        compressed.insert(s.name(), resampled.values().to_vec());
    }
    Ok(compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_motion_has_fixed_length_unit_range() {
        let mut raw = MotionData::with_frames(7);
        raw.insert("nose_x", vec![320.0, 322.0, 330.0, 341.0, 338.0, 325.0, 321.0]);
        raw.insert("nose_y", vec![240.0; 7]);
        raw.insert("velocity_magnitude", vec![0.0, 2.0, 8.0, 11.0, 3.0, 13.0, 4.0]);

        let channels = vec!["nose_x".to_string(), "nose_y".to_string()];
        let compressed = compress_motion(&raw, &channels, DEFAULT_TARGET_LENGTH).unwrap();

        assert_eq!(compressed.frames, (0..100).collect::<Vec<_>>());
        assert_eq!(compressed.channel_names().collect::<Vec<_>>(), vec!["nose_x", "nose_y"]);
        let x = compressed.channel("nose_x").unwrap();
        assert_eq!(x.len(), 100);
        assert!(x.iter().all(|v| (-1e-9..=1.0 + 1e-9).contains(v)));
        assert!(compressed.channel("nose_y").unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn missing_channel_is_named() {
        let raw = MotionData::with_frames(3);
        let err = compress_motion(&raw, &["nose_x".to_string()], 10).unwrap_err();
        assert_eq!(err, SeriesError::MissingChannel("nose_x".to_string()));
    }

    #[test]
    fn series_compression_uses_series_names() {
        let series = ScalarSeries::uniform("amplitude", vec![0.2, 0.9, 0.1, 0.8], 20.0);
        let compressed = compress_series(&[series], 10).unwrap();
        assert_eq!(compressed.channel("amplitude").unwrap().len(), 10);
        assert_eq!(compressed.len(), 10);
    }
}
