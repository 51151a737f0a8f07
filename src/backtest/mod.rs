pub mod metrics;
pub mod runner;
pub mod sweep;
pub mod synthetic;

pub use metrics::{BacktestMetrics, TradeRecord};
pub use runner::BacktestRunner;
pub use sweep::{evaluate_configs, rank_by_profit, SweepEntry};
pub use synthetic::{MarketScenario, SyntheticDataGenerator};
