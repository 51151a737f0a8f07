// Core modules
pub mod backtest;
pub mod config;
pub mod error;
pub mod exits;
pub mod indicators;
pub mod models;
pub mod risk;
pub mod session;
pub mod strategy;

// Re-export commonly used types
pub use config::StrategyConfig;
pub use error::{ConfigError, DataError};
pub use indicators::{compute_indicators, IndicatorRow};
pub use models::*;
pub use risk::StakeBounds;
pub use session::{AnalyzedFrame, EvaluationSession};
pub use strategy::Strategy;
