//! Rolling volume mean and spike detection.
//!
//! The mean window includes the current candle. A spike is
//! `volume > mean * factor`; an undefined or zero mean never spikes.

use super::moving_average::sma_series;
use super::safe_div;

pub fn volume_mean_series(volumes: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    sma_series(volumes, window)
}

/// Current volume relative to its rolling mean
pub fn volume_ratio_series(volumes: &[Option<f64>], means: &[Option<f64>]) -> Vec<Option<f64>> {
    volumes
        .iter()
        .zip(means)
        .map(|(volume, mean)| safe_div((*volume)?, (*mean)?))
        .collect()
}

pub fn volume_spike_series(ratios: &[Option<f64>], factor: f64) -> Vec<bool> {
    ratios
        .iter()
        .map(|ratio| ratio.is_some_and(|r| r > factor))
        .collect()
}
