/// Relative Strength Index (RSI)
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions. Uses Wilder's smoothing of gains and
/// losses, so the first value appears at index `period`.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// A window with neither gains nor losses has no RSI (undefined, not 50).
use super::moving_average::wilder_series;

pub fn rsi_series(closes: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut gains = vec![None; n];
    let mut losses = vec![None; n];

    for i in 1..n {
        if let (Some(prev), Some(cur)) = (closes[i - 1], closes[i]) {
            let change = cur - prev;
            gains[i] = Some(change.max(0.0));
            losses[i] = Some((-change).max(0.0));
        }
    }

    let avg_gains = wilder_series(&gains, period);
    let avg_losses = wilder_series(&losses, period);

    avg_gains
        .into_iter()
        .zip(avg_losses)
        .map(|(gain, loss)| match (gain?, loss?) {
            (g, l) if l == 0.0 && g == 0.0 => None,
            (_, l) if l == 0.0 => Some(100.0),
            (g, l) => Some(100.0 - 100.0 / (1.0 + g / l)),
        })
        .collect()
}
