/// Short-term price momentum: close[t] / close[t - lookback] - 1
///
/// Positive when the close is above the close `lookback` candles ago.
use super::safe_div;

pub fn price_momentum_series(closes: &[Option<f64>], lookback: usize) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| {
            if lookback == 0 || i < lookback {
                return None;
            }
            safe_div(closes[i]?, closes[i - lookback]?).map(|ratio| ratio - 1.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, defined, DEFAULT_EPSILON};

    #[test]
    fn test_momentum_values() {
        let closes = defined(&[100.0, 101.0, 102.0, 103.0, 104.0, 110.0, 95.0]);
        let momentum = price_momentum_series(&closes, 5);

        assert!(momentum[4].is_none());
        assert_approx(momentum[5].unwrap(), 0.10, DEFAULT_EPSILON);
        assert!(momentum[6].unwrap() < 0.0);
    }

    #[test]
    fn test_zero_base_close_is_undefined() {
        let closes = defined(&[0.0, 1.0]);
        assert_eq!(price_momentum_series(&closes, 1)[1], None);
    }
}
