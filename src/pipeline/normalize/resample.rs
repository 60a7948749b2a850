use crate::error::SeriesError;
use crate::pipeline::types::ScalarSeries;

/// Resamples onto `target_length` evenly spaced points of the normalized time domain
/// [0, 1]. The series' own timestamps place the input samples, so irregular capture
/// intervals are honoured. Output times are the normalized positions.
pub fn resample_temporal(
    series: &ScalarSeries,
    target_length: usize,
) -> Result<ScalarSeries, SeriesError> {
    check_lengths(series.len(), target_length)?;
    let positions = normalized_positions(series.times())?;
    let values = interpolate(&positions, series.values(), target_length);
    Ok(ScalarSeries::from_samples(
        series.name(),
        series.provenance().clone(),
        target_positions(target_length).zip(values),
    ))
}

/// Same as [`resample_temporal`] for values sampled at a fixed rate.
pub fn resample_values(values: &[f64], target_length: usize) -> Result<Vec<f64>, SeriesError> {
    check_lengths(values.len(), target_length)?;
    let positions = uniform_positions(values.len());
    Ok(interpolate(&positions, values, target_length))
}

fn check_lengths(actual: usize, target_length: usize) -> Result<(), SeriesError> {
    if actual < 2 {
        return Err(SeriesError::InsufficientSequenceLength {
            required: 2,
            actual,
        });
    }
    if target_length < 2 {
        return Err(SeriesError::InsufficientSequenceLength {
            required: 2,
            actual: target_length,
        });
    }
    Ok(())
}

fn uniform_positions(len: usize) -> Vec<f64> {
    let last = (len - 1) as f64;
    (0..len).map(|i| i as f64 / last).collect()
}

fn target_positions(target_length: usize) -> impl Iterator<Item = f64> {
    let last = (target_length - 1) as f64;
    (0..target_length).map(move |j| j as f64 / last)
}

// Zero-length captures (all timestamps equal) fall back to index spacing.
fn normalized_positions(times: &[f64]) -> Result<Vec<f64>, SeriesError> {
    if let Some(index) = (1..times.len()).find(|&i| times[i] < times[i - 1]) {
        return Err(SeriesError::UnorderedTime { index });
    }
    let start = times[0];
    let span = times[times.len() - 1] - start;
    if span > 0.0 {
        Ok(times.iter().map(|t| (t - start) / span).collect())
    } else {
        Ok(uniform_positions(times.len()))
    }
}

/// Piecewise-linear interpolation with linear extrapolation past either end. Repeated
/// positions keep their last sample.
fn interpolate(positions: &[f64], values: &[f64], target_length: usize) -> Vec<f64> {
    let mut xs: Vec<f64> = Vec::with_capacity(positions.len());
    let mut ys: Vec<f64> = Vec::with_capacity(values.len());
    for (&x, &y) in positions.iter().zip(values) {
        match xs.last() {
            Some(&last) if last == x => {
                if let Some(slot) = ys.last_mut() {
                    *slot = y;
                }
            }
            _ => {
                xs.push(x);
                ys.push(y);
            }
        }
    }

    let segments = xs.len() - 1;
    target_positions(target_length)
        .map(|u| {
            let k = xs
                .partition_point(|&x| x <= u)
                .saturating_sub(1)
                .min(segments - 1);
            let slope = (ys[k + 1] - ys[k]) / (xs[k + 1] - xs[k]);
            ys[k] + (u - xs[k]) * slope
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::Provenance;

    #[test]
    fn resample_hits_original_samples_on_shared_grid() {
        let values = resample_values(&[0.0, 1.0, 4.0], 5).unwrap();
        let expected = [0.0, 0.5, 1.0, 2.5, 4.0];
        for (v, e) in values.iter().zip(expected) {
            assert!((v - e).abs() < 1e-12);
        }
    }

    #[test]
    fn irregular_timestamps_place_samples() {
        let series = ScalarSeries::from_samples(
            "x",
            Provenance::new("coordinate", vec![0]),
            vec![(10.0, 0.0), (10.9, 9.0), (11.0, 10.0)],
        );
        let resampled = resample_temporal(&series, 3).unwrap();
        assert_eq!(resampled.times(), &[0.0, 0.5, 1.0]);
        let values = resampled.values();
        assert!((values[1] - 5.0).abs() < 1e-9);
        assert!((values[2] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn round_trip_recovers_smooth_series() {
        let original: Vec<f64> = (0..37)
            .map(|i| (i as f64 / 36.0 * std::f64::consts::PI).sin())
            .collect();
        let up = resample_values(&original, 100).unwrap();
        let back = resample_values(&up, original.len()).unwrap();
        for (a, b) in original.iter().zip(&back) {
            assert!((a - b).abs() < 5e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn duplicate_timestamps_do_not_divide_by_zero() {
        let series = ScalarSeries::from_samples(
            "x",
            Provenance::new("coordinate", vec![0]),
            vec![(0.0, 0.0), (0.5, 1.0), (0.5, 2.0), (1.0, 3.0)],
        );
        let values = resample_temporal(&series, 5).unwrap();
        assert!(values.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn lengths_below_two_are_refused() {
        assert_eq!(
            resample_values(&[1.0], 10),
            Err(SeriesError::InsufficientSequenceLength {
                required: 2,
                actual: 1
            })
        );
        assert_eq!(
            resample_values(&[1.0, 2.0], 1),
            Err(SeriesError::InsufficientSequenceLength {
                required: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn backwards_time_is_refused() {
        let series = ScalarSeries::from_samples(
            "x",
            Provenance::new("coordinate", vec![0]),
            vec![(0.0, 0.0), (0.5, 1.0), (0.4, 2.0)],
        );
        assert_eq!(
            resample_temporal(&series, 4).unwrap_err(),
            SeriesError::UnorderedTime { index: 2 }
        );
    }
}
