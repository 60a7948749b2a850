use crate::error::SeriesError;
use crate::pipeline::types::Extrema;

/// Three-point, first-order Savitzky-Golay smoothing. Interior samples become the window
/// mean; the two edge samples take the value of the least-squares line through the
/// outermost window.
pub fn smooth(values: &[f64]) -> Result<Vec<f64>, SeriesError> {
    let n = values.len();
    if n < 3 {
        return Err(SeriesError::InsufficientSequenceLength {
            required: 3,
            actual: n,
        });
    }

    let mut smoothed = Vec::with_capacity(n);
    smoothed.push((5.0 * values[0] + 2.0 * values[1] - values[2]) / 6.0);
    for window in values.windows(3) {
        smoothed.push(window.iter().sum::<f64>() / 3.0);
    }
    smoothed.push((-values[n - 3] + 2.0 * values[n - 2] + 5.0 * values[n - 1]) / 6.0);
    Ok(smoothed)
}

/// Smooths `values` and reports where the slope changes sign.
pub fn find_extrema(values: &[f64]) -> Result<Extrema, SeriesError> {
    let smoothed = smooth(values)?;
    let signs: Vec<i8> = smoothed.windows(2).map(|w| sign(w[1] - w[0])).collect();

    let mut extrema = Extrema::default();
    for (k, pair) in signs.windows(2).enumerate() {
        let turn = pair[1] - pair[0];
        if turn > 0 {
            extrema.minima.push(k + 1);
        } else if turn < 0 {
            extrema.maxima.push(k + 1);
        }
    }
    Ok(extrema)
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}
