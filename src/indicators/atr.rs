/// Average True Range (ATR) - Measures market volatility
///
/// ATR shows the average range of price movement over a period.
/// Higher ATR = higher volatility, lower ATR = lower volatility. Divided by
/// the close (NATR) it becomes the default volatility proxy for leverage.
///
/// True Range = max(high - low, |high - prev_close|, |low - prev_close|)
/// ATR = Wilder's smoothing of TR; the first TR needs a previous close, so
/// the first ATR appears at index `period`.
use super::moving_average::wilder_series;

pub fn true_range_series(
    highs: &[Option<f64>],
    lows: &[Option<f64>],
    closes: &[Option<f64>],
) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    for i in 1..closes.len() {
        if let (Some(high), Some(low), Some(prev_close)) = (highs[i], lows[i], closes[i - 1]) {
            let tr = (high - low)
                .max((high - prev_close).abs())
                .max((low - prev_close).abs());
            result[i] = Some(tr);
        }
    }
    result
}

pub fn atr_series(
    highs: &[Option<f64>],
    lows: &[Option<f64>],
    closes: &[Option<f64>],
    period: usize,
) -> Vec<Option<f64>> {
    wilder_series(&true_range_series(highs, lows, closes), period)
}
