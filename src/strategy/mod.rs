// Trading strategy module
pub mod momentum;
pub mod signals;

pub use momentum::MomentumStrategy;

use std::sync::Arc;

use crate::config::{StrategyConfig, StrategyKind};
use crate::indicators::IndicatorRow;
use crate::models::{Candle, ExitDecision, PairMetadata, PositionContext, RiskParameters, SignalRow};
use crate::risk::StakeBounds;

/// Capability set a host drives once per candle
///
/// Implementations hold only immutable configuration, so one instance can be
/// shared across pairs and threads.
pub trait Strategy: Send + Sync {
    /// Get strategy name
    fn name(&self) -> &str;

    /// Candles before the first row on which every indicator is defined
    fn startup_candle_count(&self) -> usize;

    fn compute_indicators(&self, candles: &[Candle], metadata: &PairMetadata) -> Vec<IndicatorRow>;

    /// `(enter_long, enter_short)` per row, before exit precedence
    fn evaluate_entries(&self, rows: &[IndicatorRow]) -> Vec<(bool, bool)>;

    /// `(exit_long, exit_short)` per row
    fn evaluate_exits(&self, rows: &[IndicatorRow]) -> Vec<(bool, bool)>;

    /// Final signal rows with exit-over-entry precedence applied
    fn populate_signals(&self, rows: &[IndicatorRow], metadata: &PairMetadata) -> Vec<SignalRow>;

    /// Leverage and stake for `row`, limited by the host's stake bounds and
    /// optional leverage cap
    fn compute_risk(
        &self,
        row: &IndicatorRow,
        position: Option<&PositionContext>,
        bounds: &StakeBounds,
        leverage_cap: Option<f64>,
    ) -> RiskParameters;

    /// Stoploss, trailing stop, ROI and profit lock, in that order
    fn evaluate_forced_exit(&self, ctx: &PositionContext) -> ExitDecision;

    /// Forced exits, then the boolean exit signal
    fn resolve_exit(&self, ctx: &PositionContext, exit_signal: bool) -> ExitDecision;

    /// Stop distance relative to the current rate (always negative)
    fn custom_stoploss(&self, ctx: &PositionContext) -> f64;
}

/// Instantiate the strategy selected by the config
pub fn build_strategy(config: Arc<StrategyConfig>) -> Box<dyn Strategy> {
    match config.strategy {
        StrategyKind::Momentum => Box::new(MomentumStrategy::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_strategy_from_config() {
        let strategy = build_strategy(Arc::new(StrategyConfig::default()));

        assert_eq!(strategy.name(), "MomentumStrategy");
        assert_eq!(strategy.startup_candle_count(), 49);
    }
}
