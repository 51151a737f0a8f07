// Technical indicators module
// Every series is aligned with its input candles and uses `None` for undefined
// values (warm-up, gaps, zero-range divisions).

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod macd;
pub mod momentum;
pub mod moving_average;
pub mod rsi;
pub mod stochastic;
pub mod volatility;
pub mod volume;
pub mod williams_r;

pub use adx::{adx_series, AdxSeries};
pub use atr::{atr_series, true_range_series};
pub use bollinger::{bollinger_series, BollingerSeries};
pub use cci::cci_series;
pub use macd::{macd_series, MacdSeries};
pub use momentum::price_momentum_series;
pub use moving_average::{ema_series, sma_series, wilder_series};
pub use rsi::rsi_series;
pub use stochastic::{stochastic_series, StochasticSeries};
pub use volatility::{range_ratio_series, returns_series, returns_std_series};
pub use volume::{volume_mean_series, volume_ratio_series, volume_spike_series};
pub use williams_r::williams_r_series;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::IndicatorConfig;
use crate::models::Candle;

/// Derived values for one candle. Same index and timestamp as its candle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub close: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub adx: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub williams_r: Option<f64>,
    pub cci: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_percent: Option<f64>,
    pub bb_width: Option<f64>,
    pub atr: Option<f64>,
    /// ATR / close
    pub natr: Option<f64>,
    /// Sample std of close-to-close returns
    pub returns_std: Option<f64>,
    /// (highest high - lowest low) / close
    pub range_ratio: Option<f64>,
    pub volume_mean: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub volume_spike: bool,
    /// close[t] / close[t-k] - 1
    pub price_momentum: Option<f64>,
}

impl IndicatorRow {
    /// Row with every indicator undefined
    pub fn undefined(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            close: None,
            ema_fast: None,
            ema_slow: None,
            adx: None,
            plus_di: None,
            minus_di: None,
            macd: None,
            macd_signal: None,
            macd_hist: None,
            rsi: None,
            stoch_k: None,
            stoch_d: None,
            williams_r: None,
            cci: None,
            bb_upper: None,
            bb_middle: None,
            bb_lower: None,
            bb_percent: None,
            bb_width: None,
            atr: None,
            natr: None,
            returns_std: None,
            range_ratio: None,
            volume_mean: None,
            volume_ratio: None,
            volume_spike: false,
            price_momentum: None,
        }
    }
}

/// Map NaN and infinities to undefined
pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// `numerator / denominator`, undefined on a zero or non-finite result
pub(crate) fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    finite(numerator / denominator)
}

/// Per-field price columns with non-finite inputs already undefined
pub(crate) struct PriceColumns {
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<f64>>,
}

impl PriceColumns {
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            high: candles.iter().map(|c| finite(c.high)).collect(),
            low: candles.iter().map(|c| finite(c.low)).collect(),
            close: candles.iter().map(|c| finite(c.close)).collect(),
            volume: candles.iter().map(|c| finite(c.volume)).collect(),
        }
    }
}

/// Highest high and lowest low over the `period` rows ending at `end`
pub(crate) fn window_range(
    highs: &[Option<f64>],
    lows: &[Option<f64>],
    end: usize,
    period: usize,
) -> Option<(f64, f64)> {
    if period == 0 || end + 1 < period {
        return None;
    }
    let start = end + 1 - period;
    let mut highest = f64::NEG_INFINITY;
    let mut lowest = f64::INFINITY;
    for i in start..=end {
        highest = highest.max(highs[i]?);
        lowest = lowest.min(lows[i]?);
    }
    Some((highest, lowest))
}

/// Compute every indicator for the candle series
///
/// Causal: row `i` only reads candles `0..=i`. Series shorter than an
/// indicator's warm-up simply leave that indicator undefined.
pub fn compute_indicators(candles: &[Candle], cfg: &IndicatorConfig) -> Vec<IndicatorRow> {
    let cols = PriceColumns::from_candles(candles);

    let ema_fast = ema_series(&cols.close, cfg.ema_fast_period);
    let ema_slow = ema_series(&cols.close, cfg.ema_slow_period);
    let adx = adx_series(&cols.high, &cols.low, &cols.close, cfg.adx_period);
    let macd = macd_series(&cols.close, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);
    let rsi = rsi_series(&cols.close, cfg.rsi_period);
    let stoch = stochastic_series(
        &cols.high,
        &cols.low,
        &cols.close,
        cfg.stoch_k_period,
        cfg.stoch_slowk_period,
        cfg.stoch_slowd_period,
    );
    let williams = williams_r_series(&cols.high, &cols.low, &cols.close, cfg.williams_r_period);
    let cci = cci_series(&cols.high, &cols.low, &cols.close, cfg.cci_period);
    let bb = bollinger_series(&cols.close, cfg.bb_period, cfg.bb_std_dev);
    let atr = atr_series(&cols.high, &cols.low, &cols.close, cfg.atr_period);
    let returns_std = returns_std_series(&cols.close, cfg.returns_std_period);
    let range_ratio = range_ratio_series(&cols.high, &cols.low, &cols.close, cfg.range_period);
    let volume_mean = volume_mean_series(&cols.volume, cfg.volume_window);
    let volume_ratio = volume_ratio_series(&cols.volume, &volume_mean);
    let volume_spike = volume_spike_series(&volume_ratio, cfg.volume_spike_factor);
    let momentum = price_momentum_series(&cols.close, cfg.momentum_lookback);

    let rows: Vec<IndicatorRow> = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let close = cols.close[i];
            IndicatorRow {
                timestamp: candle.timestamp,
                close,
                ema_fast: ema_fast[i],
                ema_slow: ema_slow[i],
                adx: adx.adx[i],
                plus_di: adx.plus_di[i],
                minus_di: adx.minus_di[i],
                macd: macd.macd[i],
                macd_signal: macd.signal[i],
                macd_hist: macd.histogram[i],
                rsi: rsi[i],
                stoch_k: stoch.k[i],
                stoch_d: stoch.d[i],
                williams_r: williams[i],
                cci: cci[i],
                bb_upper: bb.upper[i],
                bb_middle: bb.middle[i],
                bb_lower: bb.lower[i],
                bb_percent: bb.percent[i],
                bb_width: bb.width[i],
                atr: atr[i],
                natr: atr[i].zip(close).and_then(|(a, c)| safe_div(a, c)),
                returns_std: returns_std[i],
                range_ratio: range_ratio[i],
                volume_mean: volume_mean[i],
                volume_ratio: volume_ratio[i],
                volume_spike: volume_spike[i],
                price_momentum: momentum[i],
            }
        })
        .collect();

    tracing::debug!(
        "Computed indicators for {} candles (startup {})",
        rows.len(),
        cfg.startup_candle_count()
    );

    rows
}

#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-9;

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() <= epsilon,
        "expected {expected}, got {actual} (epsilon {epsilon})"
    );
}

#[cfg(test)]
pub(crate) fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

/// Candles with a given close series and a fixed 1% high/low spread
#[cfg(test)]
pub(crate) fn create_test_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::{Duration, TimeZone};

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: start + Duration::minutes(15 * i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1000.0,
        })
        .collect()
}
