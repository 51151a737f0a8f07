use chrono::{DateTime, Utc};
use thiserror::Error;

/// Configuration problems. The only errors that stop an evaluation session.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid leverage range: min {min} > max {max}")]
    LeverageRange { min: f64, max: f64 },

    #[error("leverage bounds must be positive (min {min}, base {base})")]
    NonPositiveLeverage { min: f64, base: f64 },

    #[error("invalid stake bounds: min {min}, max {max}")]
    StakeBounds { min: f64, max: f64 },

    #[error("{name} period must be >= 1")]
    ZeroPeriod { name: &'static str },

    #[error("MACD fast period ({fast}) must be shorter than slow period ({slow})")]
    MacdPeriods { fast: usize, slow: usize },

    #[error("ROI table key {0:?} is not a whole number of minutes")]
    RoiKey(String),

    #[error("ROI table has more than one entry for {0} minutes")]
    RoiDuplicate(i64),

    #[error("stoploss must be negative, got {0}")]
    Stoploss(f64),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Candle series that break the ordering invariant.
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("candles are not sorted: {next} follows {prev} at index {index}")]
    Unsorted {
        index: usize,
        prev: DateTime<Utc>,
        next: DateTime<Utc>,
    },

    #[error("duplicate candle timestamp {timestamp} at index {index}")]
    Duplicate {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("not enough candles: {got}, need {needed}")]
    Insufficient { got: usize, needed: usize },
}
