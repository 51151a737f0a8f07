//! Slow stochastic oscillator.
//!
//! Fast %K = 100 * (close - lowest low) / (highest high - lowest low) over
//! `k_period`; slow %K is its SMA over `slowk_period` and %D the SMA of slow
//! %K over `slowd_period`. A zero high-low range leaves fast %K undefined.

use super::moving_average::sma_series;
use super::{safe_div, window_range};

pub struct StochasticSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

pub fn stochastic_series(
    highs: &[Option<f64>],
    lows: &[Option<f64>],
    closes: &[Option<f64>],
    k_period: usize,
    slowk_period: usize,
    slowd_period: usize,
) -> StochasticSeries {
    let fast_k: Vec<Option<f64>> = (0..closes.len())
        .map(|i| {
            let (highest, lowest) = window_range(highs, lows, i, k_period)?;
            safe_div(closes[i]? - lowest, highest - lowest).map(|v| v * 100.0)
        })
        .collect();

    let k = sma_series(&fast_k, slowk_period);
    let d = sma_series(&k, slowd_period);
    StochasticSeries { k, d }
}
