//! Moving averages over possibly-undefined series.
//!
//! Every function returns a vector aligned with its input. A value is `None`
//! until `period` consecutive defined inputs have been seen; an undefined input
//! resets the smoothers, which then need a fresh seed.

/// Simple Moving Average (SMA)
pub fn sma_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return result;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let sum: Option<f64> = window.iter().copied().sum();
        result[i] = sum.map(|s| s / period as f64);
    }

    result
}

/// Exponential Moving Average (EMA), seeded with the SMA of the first window
pub fn ema_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    smoothed_series(values, period, 2.0 / (period as f64 + 1.0))
}

/// Wilder's smoothing (RMA): EMA with alpha = 1 / period
///
/// Used by RSI, ATR and ADX.
pub fn wilder_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    smoothed_series(values, period, 1.0 / period as f64)
}

fn smoothed_series(values: &[Option<f64>], period: usize, alpha: f64) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 {
        return result;
    }

    let mut prev: Option<f64> = None;
    let mut seed_sum = 0.0;
    let mut seed_count = 0;

    for (i, value) in values.iter().enumerate() {
        let Some(value) = *value else {
            prev = None;
            seed_sum = 0.0;
            seed_count = 0;
            continue;
        };

        let next = match prev {
            Some(p) => p + alpha * (value - p),
            None => {
                seed_sum += value;
                seed_count += 1;
                if seed_count < period {
                    continue;
                }
                seed_sum / period as f64
            }
        };

        prev = Some(next);
        result[i] = Some(next);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, defined, DEFAULT_EPSILON};

    #[test]
    fn test_sma() {
        let prices = defined(&[100.0, 102.0, 104.0, 106.0, 108.0]);
        let sma = sma_series(&prices, 5);
        assert_eq!(sma[3], None);
        assert_eq!(sma[4], Some(104.0));
    }

    #[test]
    fn test_sma_insufficient_data() {
        let prices = defined(&[100.0, 102.0]);
        let sma = sma_series(&prices, 5);
        assert!(sma.iter().all(Option::is_none));
    }

    #[test]
    fn test_sma_window_with_gap_is_undefined() {
        let mut prices = defined(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        prices[2] = None;
        let sma = sma_series(&prices, 2);
        assert_eq!(sma[1], Some(1.5));
        assert_eq!(sma[2], None);
        assert_eq!(sma[3], None);
        assert_eq!(sma[4], Some(4.5));
    }

    #[test]
    fn test_ema_known_values() {
        // alpha = 0.5, seed SMA(10, 11, 12) = 11
        let prices = defined(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let ema = ema_series(&prices, 3);

        assert_eq!(ema[0], None);
        assert_eq!(ema[1], None);
        assert_approx(ema[2].unwrap(), 11.0, DEFAULT_EPSILON);
        assert_approx(ema[3].unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(ema[4].unwrap(), 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn test_ema_reseeds_after_gap() {
        let mut prices = defined(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        prices[3] = None;
        let ema = ema_series(&prices, 3);

        assert!(ema[2].is_some());
        assert_eq!(ema[3], None);
        assert_eq!(ema[4], None);
        assert_eq!(ema[5], None);
        // Fresh seed: SMA(14, 15, 16)
        assert_approx(ema[6].unwrap(), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn test_wilder_known_values() {
        // seed SMA(1, 2, 3) = 2, then 2 + (6 - 2) / 3
        let values = defined(&[1.0, 2.0, 3.0, 6.0]);
        let rma = wilder_series(&values, 3);
        assert_approx(rma[2].unwrap(), 2.0, DEFAULT_EPSILON);
        assert_approx(rma[3].unwrap(), 2.0 + 4.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn test_leading_undefined_values_delay_seed() {
        let values = vec![None, None, Some(1.0), Some(2.0), Some(3.0)];
        let ema = ema_series(&values, 2);
        assert_eq!(ema[2], None);
        assert_approx(ema[3].unwrap(), 1.5, DEFAULT_EPSILON);
    }
}
