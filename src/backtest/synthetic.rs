use crate::models::Candle;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketScenario {
    /// Steady uptrend with noise (+2% daily average)
    Uptrend,
    /// Steady downtrend with noise (-2% daily average)
    Downtrend,
    /// Sideways/choppy market (±1% around mean)
    Sideways,
    /// High volatility (±5% large swings)
    Volatile,
    /// Deterministic stair-step uptrend: four rises of 0.5% of the base price,
    /// four pullbacks of 0.3%, and a 3x volume burst on the third rise of each cycle.
    /// Ignores the seed.
    Pullbacks,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 5] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
        MarketScenario::Pullbacks,
    ];
}

impl fmt::Display for MarketScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarketScenario::Uptrend => "uptrend",
            MarketScenario::Downtrend => "downtrend",
            MarketScenario::Sideways => "sideways",
            MarketScenario::Volatile => "volatile",
            MarketScenario::Pullbacks => "pullbacks",
        };
        f.write_str(name)
    }
}

impl FromStr for MarketScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarketScenario::ALL
            .into_iter()
            .find(|scenario| scenario.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown scenario {s:?} (expected uptrend, downtrend, sideways, volatile or pullbacks)"
                )
            })
    }
}

const PULLBACK_CYCLE: usize = 8;

/// Price change of candle `index` in the pullback scenario, as a fraction of
/// the base price. The first candle opens at the base price.
fn pullback_step(index: usize) -> f64 {
    match index {
        0 => 0.0,
        i if (i - 1) % PULLBACK_CYCLE < 4 => 0.005,
        _ => -0.003,
    }
}

/// Generates synthetic price data for backtesting
///
/// Same seed, scenario and length always give the same candles.
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
    start_time: DateTime<Utc>,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 40_000.0,
            base_volume: 1_000.0,
            start_time: Utc.timestamp_opt(1_704_067_200, 0).single().unwrap_or_default(),
        }
    }

    pub fn with_base_price(mut self, base_price: f64) -> Self {
        self.base_price = base_price;
        self
    }

    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    /// Generate candles for a specific market scenario
    ///
    /// # Arguments
    /// * `scenario` - The market scenario to simulate
    /// * `num_candles` - Number of candles to generate
    /// * `interval_minutes` - Minutes between candles (15 for the default timeframe)
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_candles: usize,
        interval_minutes: i64,
    ) -> Vec<Candle> {
        let intervals_per_day = 24.0 * 60.0 / interval_minutes as f64;
        let mut candles = Vec::with_capacity(num_candles);
        let mut current_price = self.base_price;

        for i in 0..num_candles {
            let timestamp = self.start_time + Duration::minutes(i as i64 * interval_minutes);

            let open = current_price;
            current_price = self.next_price(scenario, current_price, i, intervals_per_day);

            let candle = match scenario {
                MarketScenario::Pullbacks => {
                    self.pullback_candle(i, open, current_price, timestamp)
                }
                _ => self.create_candle(current_price, timestamp),
            };
            candles.push(candle);
        }

        candles
    }

    /// Fixed 0.2% wicks around the open/close body, no randomness
    fn pullback_candle(
        &self,
        index: usize,
        open: f64,
        close: f64,
        timestamp: DateTime<Utc>,
    ) -> Candle {
        let burst = index % PULLBACK_CYCLE == 3;
        Candle {
            timestamp,
            open,
            high: open.max(close) * 1.002,
            low: open.min(close) * 0.998,
            close,
            volume: if burst {
                self.base_volume * 3.0
            } else {
                self.base_volume
            },
        }
    }

    fn next_price(
        &mut self,
        scenario: MarketScenario,
        price: f64,
        index: usize,
        intervals_per_day: f64,
    ) -> f64 {
        match scenario {
            MarketScenario::Uptrend | MarketScenario::Downtrend => {
                let sign = if scenario == MarketScenario::Uptrend {
                    1.0
                } else {
                    -1.0
                };
                // Drift + reduced noise so trend is dominant
                let drift = price * sign * 0.02 / intervals_per_day;
                let noise = price * self.rng.gen_range(-0.001..0.001);
                price + drift + noise
            }
            MarketScenario::Sideways => {
                // Mean reversion force + noise
                let reversion = (self.base_price - price) * 0.1;
                let noise = price * self.rng.gen_range(-0.01..0.01);
                price + reversion + noise
            }
            MarketScenario::Volatile => {
                let change = price * self.rng.gen_range(-0.05..0.05);
                // Prevent price from going too low
                (price + change).max(self.base_price * 0.5)
            }
            MarketScenario::Pullbacks => price + self.base_price * pullback_step(index),
        }
    }

    /// Helper to create a candle from price and timestamp
    fn create_candle(&mut self, price: f64, timestamp: DateTime<Utc>) -> Candle {
        let noise_pct = 0.002; // ±0.2% intrabar movement

        let high = price * (1.0 + self.rng.gen_range(0.0..noise_pct));
        let low = price * (1.0 - self.rng.gen_range(0.0..noise_pct));

        let open_raw = price * (1.0 + self.rng.gen_range(-noise_pct..noise_pct));
        let open = open_raw.clamp(low, high);

        // Vary volume ±30%, with occasional bursts
        let mut volume = self.base_volume * self.rng.gen_range(0.7..1.3);
        if self.rng.gen_bool(0.05) {
            volume *= 2.5;
        }

        Candle {
            timestamp,
            open,
            high,
            low,
            close: price,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uptrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Uptrend, 500, 15);

        assert_eq!(candles.len(), 500);

        let first_price = candles.first().unwrap().close;
        let last_price = candles.last().unwrap().close;

        assert!(
            last_price > first_price,
            "Uptrend should end higher: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_downtrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Downtrend, 500, 15);

        let first_price = candles.first().unwrap().close;
        let last_price = candles.last().unwrap().close;

        assert!(
            last_price < first_price,
            "Downtrend should end lower: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_sideways() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Sideways, 500, 15);

        // Should stay roughly around base price (±10%)
        let base = gen.base_price;
        for candle in &candles {
            assert!(
                candle.close > base * 0.9 && candle.close < base * 1.1,
                "Sideways should stay near base: {} vs {}",
                candle.close,
                base
            );
        }
    }

    #[test]
    fn test_same_seed_same_candles() {
        let a = SyntheticDataGenerator::new(7).generate(MarketScenario::Volatile, 200, 15);
        let b = SyntheticDataGenerator::new(7).generate(MarketScenario::Volatile, 200, 15);
        assert_eq!(a, b);
    }

    #[test]
    fn test_timestamps_are_sequential() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Uptrend, 100, 15);

        for i in 1..candles.len() {
            assert!(
                candles[i].timestamp > candles[i - 1].timestamp,
                "Timestamps should be sequential"
            );
        }
    }

    #[test]
    fn test_ohlc_consistency() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Volatile, 100, 15);

        for candle in &candles {
            assert!(candle.high >= candle.close, "High should be >= close");
            assert!(candle.high >= candle.open, "High should be >= open");
            assert!(candle.low <= candle.close, "Low should be <= close");
            assert!(candle.low <= candle.open, "Low should be <= open");
        }
    }

    #[test]
    fn test_pullbacks_step_pattern() {
        let candles = SyntheticDataGenerator::new(1)
            .with_base_price(100.0)
            .generate(MarketScenario::Pullbacks, 17, 15);

        assert_eq!(candles[0].close, 100.0);
        // Cycle 1..=8: four +0.5 steps, four -0.3 steps
        assert!((candles[4].close - 102.0).abs() < 1e-9);
        assert!((candles[8].close - 100.8).abs() < 1e-9);
        assert!((candles[16].close - 101.6).abs() < 1e-9);

        for (i, candle) in candles.iter().enumerate() {
            let expected = if i % 8 == 3 { 3_000.0 } else { 1_000.0 };
            assert_eq!(candle.volume, expected, "volume at {}", i);
            assert!(candle.high > candle.open.max(candle.close));
            assert!(candle.low < candle.open.min(candle.close));
        }
        assert_eq!(candles[5].open, candles[4].close);
    }

    #[test]
    fn test_pullbacks_ignore_seed() {
        let a = SyntheticDataGenerator::new(1).generate(MarketScenario::Pullbacks, 50, 15);
        let b = SyntheticDataGenerator::new(99).generate(MarketScenario::Pullbacks, 50, 15);
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_start_time() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let candles = SyntheticDataGenerator::new(3)
            .with_start_time(start)
            .generate(MarketScenario::Sideways, 4, 60);

        assert_eq!(candles[0].timestamp, start);
        assert_eq!(candles[3].timestamp, start + Duration::hours(3));
    }

    #[test]
    fn test_scenario_from_str() {
        assert_eq!("Uptrend".parse::<MarketScenario>(), Ok(MarketScenario::Uptrend));
        assert_eq!("volatile".parse::<MarketScenario>(), Ok(MarketScenario::Volatile));
        assert_eq!("pullbacks".parse::<MarketScenario>(), Ok(MarketScenario::Pullbacks));
        assert!("crash".parse::<MarketScenario>().is_err());
    }
}
