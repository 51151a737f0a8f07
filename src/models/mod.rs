use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DataError;

/// OHLCV candlestick data, one per timeframe bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Pair and timeframe the candle series belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PairMetadata {
    pub pair: String,
    pub timeframe: String,
}

impl PairMetadata {
    pub fn new(pair: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            pair: pair.into(),
            timeframe: timeframe.into(),
        }
    }
}

/// Side of a futures position
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// Per-candle entry/exit intents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalRow {
    pub timestamp: DateTime<Utc>,
    pub enter_long: bool,
    pub enter_short: bool,
    pub exit_long: bool,
    pub exit_short: bool,
    pub enter_tag: Option<String>,
}

impl SignalRow {
    pub fn entry(&self, direction: Direction) -> bool {
        match direction {
            Direction::Long => self.enter_long,
            Direction::Short => self.enter_short,
        }
    }

    pub fn exit(&self, direction: Direction) -> bool {
        match direction {
            Direction::Long => self.exit_long,
            Direction::Short => self.exit_short,
        }
    }
}

/// Open position state, owned by the host. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionContext {
    pub pair: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub current_price: f64,
    pub current_time: DateTime<Utc>,
    /// Current profit as a fraction of stake (0.02 = +2%)
    pub current_profit: f64,
    /// Highest profit seen since entry, as last reported back by the engine
    pub peak_profit: Option<f64>,
}

impl PositionContext {
    /// Whole minutes since entry (negative if the host clock went backwards)
    pub fn elapsed_minutes(&self) -> i64 {
        (self.current_time - self.entry_time).num_minutes()
    }
}

/// Leverage and stake for a new entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskParameters {
    pub leverage: f64,
    pub stake_amount: f64,
    /// Volatility proxy the parameters were derived from, if it was defined
    pub volatility: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    RoiTarget,
    Custom,
    ExitSignal,
}

impl ExitReason {
    pub fn tag(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stoploss",
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::RoiTarget => "roi_target",
            ExitReason::Custom => "custom",
            ExitReason::ExitSignal => "exit_signal",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Result of one exit evaluation tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExitDecision {
    pub exit: bool,
    pub reason: Option<ExitReason>,
    /// Updated peak profit; the host stores it into the next `PositionContext`
    pub peak_profit: f64,
}

impl ExitDecision {
    pub fn hold(peak_profit: f64) -> Self {
        Self {
            exit: false,
            reason: None,
            peak_profit,
        }
    }

    pub fn exit(reason: ExitReason, peak_profit: f64) -> Self {
        Self {
            exit: true,
            reason: Some(reason),
            peak_profit,
        }
    }
}

/// Check that timestamps are strictly increasing
pub fn validate_candles(candles: &[Candle]) -> Result<(), DataError> {
    for (i, window) in candles.windows(2).enumerate() {
        let (prev, next) = (window[0].timestamp, window[1].timestamp);
        if next == prev {
            return Err(DataError::Duplicate {
                index: i + 1,
                timestamp: next,
            });
        }
        if next < prev {
            return Err(DataError::Unsorted {
                index: i + 1,
                prev,
                next,
            });
        }
    }
    Ok(())
}
