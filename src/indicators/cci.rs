/// Commodity Channel Index (CCI)
///
/// CCI = (TP - SMA(TP)) / (0.015 * mean deviation), TP = (high + low + close) / 3
///
/// Readings above +100 / below -100 mark stretched moves. Zero mean
/// deviation (a flat window) is undefined.
use super::moving_average::sma_series;
use super::safe_div;

const LAMBERT_CONSTANT: f64 = 0.015;

pub fn cci_series(
    highs: &[Option<f64>],
    lows: &[Option<f64>],
    closes: &[Option<f64>],
    period: usize,
) -> Vec<Option<f64>> {
    let typical: Vec<Option<f64>> = (0..closes.len())
        .map(|i| Some((highs[i]? + lows[i]? + closes[i]?) / 3.0))
        .collect();
    let mean = sma_series(&typical, period);

    (0..typical.len())
        .map(|i| {
            let (tp, avg) = (typical[i]?, mean[i]?);
            let mean_deviation = typical[i + 1 - period..=i]
                .iter()
                .flatten()
                .map(|v| (v - avg).abs())
                .sum::<f64>()
                / period as f64;
            safe_div(tp - avg, LAMBERT_CONSTANT * mean_deviation)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, defined, DEFAULT_EPSILON};

    #[test]
    fn test_cci_known_value() {
        // TP = close; mean 2, mean deviation 2/3
        let closes = defined(&[1.0, 2.0, 3.0]);
        let cci = cci_series(&closes, &closes, &closes, 3);

        assert!(cci[1].is_none());
        assert_approx(cci[2].unwrap(), 1.0 / (0.015 * 2.0 / 3.0), 1e-6);
    }

    #[test]
    fn test_cci_flat_is_undefined() {
        let flat = defined(&[100.0; 20]);
        let cci = cci_series(&flat, &flat, &flat, 14);
        assert!(cci.iter().all(Option::is_none));
    }

    #[test]
    fn test_cci_sign_follows_trend() {
        let up: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let down: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();

        let cci_up = cci_series(&defined(&up), &defined(&up), &defined(&up), 14);
        let cci_down = cci_series(&defined(&down), &defined(&down), &defined(&down), 14);
        assert!(cci_up[19].unwrap() > 0.0);
        assert!(cci_down[19].unwrap() < 0.0);
        assert_approx(cci_up[19].unwrap(), -cci_down[19].unwrap(), DEFAULT_EPSILON);
    }
}
