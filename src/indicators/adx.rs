/// Average Directional Index (ADX) - Measures trend strength
///
/// ADX ranges from 0 to 100:
/// - ADX > 25: Strong trend (bull or bear)
/// - ADX 20-25: Moderate trend
/// - ADX < 20: Weak trend / choppy / ranging market
///
/// Also returns +DI and -DI to determine trend direction:
/// - +DI > -DI: Uptrend
/// - -DI > +DI: Downtrend
///
/// TR, +DM and -DM are Wilder-smoothed, so DI is defined from index `period`
/// and ADX (the smoothed DX) from index `2 * period - 1`.
use super::atr::true_range_series;
use super::moving_average::wilder_series;

pub struct AdxSeries {
    pub adx: Vec<Option<f64>>,
    pub plus_di: Vec<Option<f64>>,
    pub minus_di: Vec<Option<f64>>,
}

pub fn adx_series(
    highs: &[Option<f64>],
    lows: &[Option<f64>],
    closes: &[Option<f64>],
    period: usize,
) -> AdxSeries {
    let n = closes.len();
    let mut plus_dms = vec![None; n];
    let mut minus_dms = vec![None; n];

    for i in 1..n {
        if let (Some(high), Some(low), Some(prev_high), Some(prev_low)) =
            (highs[i], lows[i], highs[i - 1], lows[i - 1])
        {
            let up_move = high - prev_high;
            let down_move = prev_low - low;

            plus_dms[i] = Some(if up_move > down_move && up_move > 0.0 {
                up_move
            } else {
                0.0
            });
            minus_dms[i] = Some(if down_move > up_move && down_move > 0.0 {
                down_move
            } else {
                0.0
            });
        }
    }

    let smoothed_tr = wilder_series(&true_range_series(highs, lows, closes), period);
    let smoothed_plus = wilder_series(&plus_dms, period);
    let smoothed_minus = wilder_series(&minus_dms, period);

    let mut plus_di = vec![None; n];
    let mut minus_di = vec![None; n];
    let mut dx = vec![None; n];

    for i in 0..n {
        let (Some(tr), Some(plus), Some(minus)) = (smoothed_tr[i], smoothed_plus[i], smoothed_minus[i])
        else {
            continue;
        };

        // A perfectly flat stretch has no directional movement
        let (pdi, mdi) = if tr > 0.0 {
            (100.0 * plus / tr, 100.0 * minus / tr)
        } else {
            (0.0, 0.0)
        };
        let di_sum = pdi + mdi;

        plus_di[i] = Some(pdi);
        minus_di[i] = Some(mdi);
        dx[i] = Some(if di_sum > 0.0 {
            100.0 * (pdi - mdi).abs() / di_sum
        } else {
            0.0
        });
    }

    AdxSeries {
        adx: wilder_series(&dx, period),
        plus_di,
        minus_di,
    }
}
