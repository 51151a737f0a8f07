//! Volatility proxies used by leverage sizing alongside NATR and band width.
//!
//! `returns_std` is the sample standard deviation of close-to-close returns
//! over the last `period` returns, first defined at index `period`.
//! `range_ratio` is (highest high - lowest low) / close over `period` candles,
//! first defined at index `period - 1`.

use super::{safe_div, window_range};

/// close[t] / close[t-1] - 1
pub fn returns_series(closes: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| {
            let prev = closes[i.checked_sub(1)?]?;
            safe_div(closes[i]?, prev).map(|ratio| ratio - 1.0)
        })
        .collect()
}

pub fn returns_std_series(closes: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let returns = returns_series(closes);
    let mut result = vec![None; returns.len()];
    if period < 2 {
        return result;
    }

    for i in period..returns.len() {
        let window: Option<Vec<f64>> = returns[i + 1 - period..=i].iter().copied().collect();
        let Some(window) = window else {
            continue;
        };
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance =
            window.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        result[i] = Some(variance.sqrt()).filter(|v| v.is_finite());
    }

    result
}

pub fn range_ratio_series(
    highs: &[Option<f64>],
    lows: &[Option<f64>],
    closes: &[Option<f64>],
    period: usize,
) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| {
            let (highest, lowest) = window_range(highs, lows, i, period)?;
            safe_div(highest - lowest, closes[i]?)
        })
        .collect()
}
