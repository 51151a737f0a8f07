/// Williams %R
///
/// %R = -100 * (highest high - close) / (highest high - lowest low)
///
/// Ranges from -100 (close at the low) to 0 (close at the high). A zero
/// high-low range is undefined rather than an error.
use super::{safe_div, window_range};

pub fn williams_r_series(
    highs: &[Option<f64>],
    lows: &[Option<f64>],
    closes: &[Option<f64>],
    period: usize,
) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| {
            let (highest, lowest) = window_range(highs, lows, i, period)?;
            safe_div(highest - closes[i]?, highest - lowest).map(|v| v * -100.0)
        })
        .collect()
}
