use std::sync::Arc;

use super::{signals, Strategy};
use crate::config::StrategyConfig;
use crate::exits;
use crate::indicators::{self, IndicatorRow};
use crate::models::{Candle, ExitDecision, PairMetadata, PositionContext, RiskParameters, SignalRow};
use crate::risk::{self, StakeBounds};

/// Momentum strategy for leveraged futures
///
/// This strategy enters on momentum shifts confirmed by:
/// - MACD crossover for the trigger
/// - Volume spike over the rolling mean
/// - Close relative to the fast EMA for trend direction
/// - ADX for trend strength, RSI to avoid chasing extremes
///
/// Leverage and stake scale down with volatility. Exits combine the ROI
/// schedule, a static stoploss, a trailing stop and a tiered profit lock.
#[derive(Debug, Clone)]
pub struct MomentumStrategy {
    config: Arc<StrategyConfig>,
}

impl MomentumStrategy {
    pub fn new(config: Arc<StrategyConfig>) -> Self {
        Self { config }
    }
}

impl Default for MomentumStrategy {
    fn default() -> Self {
        Self::new(Arc::new(StrategyConfig::default()))
    }
}

impl Strategy for MomentumStrategy {
    fn name(&self) -> &str {
        "MomentumStrategy"
    }

    fn startup_candle_count(&self) -> usize {
        self.config.startup_candle_count()
    }

    fn compute_indicators(&self, candles: &[Candle], metadata: &PairMetadata) -> Vec<IndicatorRow> {
        if candles.len() <= self.startup_candle_count() {
            tracing::debug!(
                "{} {}: {} candles, indicators complete from candle {}",
                metadata.pair,
                metadata.timeframe,
                candles.len(),
                self.startup_candle_count() + 1
            );
        }
        indicators::compute_indicators(candles, &self.config.indicators)
    }

    fn evaluate_entries(&self, rows: &[IndicatorRow]) -> Vec<(bool, bool)> {
        signals::evaluate_entries(rows, &self.config.signals)
    }

    fn evaluate_exits(&self, rows: &[IndicatorRow]) -> Vec<(bool, bool)> {
        signals::evaluate_exits(rows, &self.config.signals)
    }

    fn populate_signals(&self, rows: &[IndicatorRow], metadata: &PairMetadata) -> Vec<SignalRow> {
        let signals = signals::evaluate_signals(rows, &self.config.signals);

        let entries = signals
            .iter()
            .filter(|s| s.enter_long || s.enter_short)
            .count();
        let exits = signals.iter().filter(|s| s.exit_long || s.exit_short).count();
        tracing::debug!(
            "{} {}: {} rows, {} entry rows, {} exit rows",
            metadata.pair,
            metadata.timeframe,
            signals.len(),
            entries,
            exits
        );

        signals
    }

    fn compute_risk(
        &self,
        row: &IndicatorRow,
        position: Option<&PositionContext>,
        bounds: &StakeBounds,
        leverage_cap: Option<f64>,
    ) -> RiskParameters {
        risk::compute_risk(row, position, &self.config.risk, bounds, leverage_cap)
    }

    fn evaluate_forced_exit(&self, ctx: &PositionContext) -> ExitDecision {
        exits::evaluate_forced_exit(ctx, &self.config.exits)
    }

    fn resolve_exit(&self, ctx: &PositionContext, exit_signal: bool) -> ExitDecision {
        exits::resolve_exit(ctx, exit_signal, &self.config.exits)
    }

    fn custom_stoploss(&self, ctx: &PositionContext) -> f64 {
        exits::custom_stoploss(ctx, &self.config.exits)
    }
}
