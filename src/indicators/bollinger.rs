/// Bollinger Bands
///
/// Middle band is the SMA of the close; upper/lower sit `std_dev` population
/// standard deviations away. `%b` places the close inside the band
/// (0 = lower, 1 = upper) and width is `(upper - lower) / middle`.
///
/// A zero-width band has no `%b`, and a zero middle band has no width.
use super::moving_average::sma_series;
use super::safe_div;

pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    pub percent: Vec<Option<f64>>,
    pub width: Vec<Option<f64>>,
}

pub fn bollinger_series(closes: &[Option<f64>], period: usize, std_dev: f64) -> BollingerSeries {
    let n = closes.len();
    let middle = sma_series(closes, period);
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];
    let mut percent = vec![None; n];
    let mut width = vec![None; n];

    for i in 0..n {
        let (Some(mean), Some(close)) = (middle[i], closes[i]) else {
            continue;
        };

        // middle[i] defined implies a full window of defined closes
        let window = &closes[i + 1 - period..=i];
        let variance = window
            .iter()
            .flatten()
            .map(|c| (c - mean).powi(2))
            .sum::<f64>()
            / period as f64;
        let band = std_dev * variance.sqrt();

        let up = mean + band;
        let low = mean - band;
        upper[i] = Some(up);
        lower[i] = Some(low);
        percent[i] = safe_div(close - low, up - low);
        width[i] = safe_div(up - low, mean);
    }

    BollingerSeries {
        upper,
        middle,
        lower,
        percent,
        width,
    }
}
