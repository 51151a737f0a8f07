//! One evaluation session: an immutable config plus the strategy built from it.
//!
//! `analyze` is pure. Sessions can be shared across threads and pairs; nothing
//! inside is mutated after construction.

use serde::Serialize;
use std::sync::Arc;

use crate::config::StrategyConfig;
use crate::error::ConfigError;
use crate::indicators::IndicatorRow;
use crate::models::{Candle, ExitDecision, PairMetadata, PositionContext, RiskParameters, SignalRow};
use crate::risk::StakeBounds;
use crate::strategy::{build_strategy, Strategy};

/// Indicator and signal rows for one pair, aligned with the input candles
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyzedFrame {
    pub metadata: PairMetadata,
    pub indicators: Vec<IndicatorRow>,
    pub signals: Vec<SignalRow>,
}

impl AnalyzedFrame {
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn last_indicators(&self) -> Option<&IndicatorRow> {
        self.indicators.last()
    }

    pub fn last_signal(&self) -> Option<&SignalRow> {
        self.signals.last()
    }
}

pub struct EvaluationSession {
    config: Arc<StrategyConfig>,
    strategy: Box<dyn Strategy>,
}

impl EvaluationSession {
    /// Validate the config and build its strategy
    pub fn new(config: StrategyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        let strategy = build_strategy(Arc::clone(&config));

        tracing::info!(
            "Session started: {} on {} (startup {} candles)",
            strategy.name(),
            config.timeframe,
            strategy.startup_candle_count()
        );

        Ok(Self { config, strategy })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    pub fn startup_candle_count(&self) -> usize {
        self.strategy.startup_candle_count()
    }

    /// Indicators and signals for a candle series
    ///
    /// Candles are expected in ascending timestamp order; hosts that cannot
    /// guarantee it should run `models::validate_candles` first.
    pub fn analyze(&self, candles: &[Candle], metadata: &PairMetadata) -> AnalyzedFrame {
        if metadata.timeframe != self.config.timeframe {
            tracing::warn!(
                "{} candles are {} but the session is configured for {}",
                metadata.pair,
                metadata.timeframe,
                self.config.timeframe
            );
        }

        let indicators = self.strategy.compute_indicators(candles, metadata);
        let signals = self.strategy.populate_signals(&indicators, metadata);

        AnalyzedFrame {
            metadata: metadata.clone(),
            indicators,
            signals,
        }
    }

    /// Risk parameters from the latest row of the frame
    ///
    /// `None` for an empty frame. `leverage_cap` is the exchange's maximum
    /// leverage for the pair, if the host knows it.
    pub fn risk_for(
        &self,
        frame: &AnalyzedFrame,
        position: Option<&PositionContext>,
        bounds: &StakeBounds,
        leverage_cap: Option<f64>,
    ) -> Option<RiskParameters> {
        let row = frame.last_indicators()?;
        Some(self.strategy.compute_risk(row, position, bounds, leverage_cap))
    }

    pub fn forced_exit(&self, ctx: &PositionContext) -> ExitDecision {
        self.strategy.evaluate_forced_exit(ctx)
    }

    pub fn resolve_exit(&self, ctx: &PositionContext, exit_signal: bool) -> ExitDecision {
        self.strategy.resolve_exit(ctx, exit_signal)
    }

    pub fn custom_stoploss(&self, ctx: &PositionContext) -> f64 {
        self.strategy.custom_stoploss(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::create_test_candles;
    use crate::models::{Direction, ExitReason};
    use chrono::Duration;

    fn closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 30_000.0 + i as f64 * 15.0 + (i as f64 * 0.5).sin() * 120.0)
            .collect()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = StrategyConfig::default();
        config.risk.max_leverage = 2.0;

        assert!(EvaluationSession::new(config).is_err());
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let session = EvaluationSession::new(StrategyConfig::default()).unwrap();
        let candles = create_test_candles(&closes(150));
        let metadata = PairMetadata::new("BTC/USDT", "15m");

        let first = session.analyze(&candles, &metadata);
        let second = session.analyze(&candles, &metadata);

        assert_eq!(first, second);
        assert_eq!(first.len(), 150);
    }

    #[test]
    fn test_sessions_shared_across_threads() {
        let session = Arc::new(EvaluationSession::new(StrategyConfig::default()).unwrap());
        let candles = Arc::new(create_test_candles(&closes(120)));

        let handles: Vec<_> = ["BTC/USDT", "ETH/USDT"]
            .into_iter()
            .map(|pair| {
                let session = Arc::clone(&session);
                let candles = Arc::clone(&candles);
                std::thread::spawn(move || {
                    session.analyze(&candles, &PairMetadata::new(pair, "15m"))
                })
            })
            .collect();

        let frames: Vec<AnalyzedFrame> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(frames[0].signals, frames[1].signals);
    }

    #[test]
    fn test_risk_for_uses_last_row() {
        let session = EvaluationSession::new(StrategyConfig::default()).unwrap();
        let candles = create_test_candles(&closes(80));
        let frame = session.analyze(&candles, &PairMetadata::new("BTC/USDT", "15m"));
        let bounds = StakeBounds::new(10.0, 1000.0).unwrap();

        let params = session.risk_for(&frame, None, &bounds, None).unwrap();
        assert!((5.0..=20.0).contains(&params.leverage));
        assert_eq!(params.volatility, frame.last_indicators().unwrap().natr);

        let capped = session.risk_for(&frame, None, &bounds, Some(2.0)).unwrap();
        assert_eq!(capped.leverage, 2.0);
        assert_eq!(capped.stake_amount, params.stake_amount);
    }

    #[test]
    fn test_risk_for_empty_frame() {
        let session = EvaluationSession::new(StrategyConfig::default()).unwrap();
        let frame = session.analyze(&[], &PairMetadata::new("BTC/USDT", "15m"));
        let bounds = StakeBounds::new(10.0, 1000.0).unwrap();

        assert!(session.risk_for(&frame, None, &bounds, None).is_none());
    }

    #[test]
    fn test_stoploss_through_session() {
        let session = EvaluationSession::new(StrategyConfig::default()).unwrap();
        let candles = create_test_candles(&[100.0, 89.0]);
        let entry_time = candles[0].timestamp;
        let ctx = PositionContext {
            pair: "BTC/USDT".to_string(),
            direction: Direction::Long,
            entry_price: 100.0,
            entry_time,
            current_price: 98.9,
            current_time: entry_time + Duration::hours(2),
            current_profit: -0.11,
            peak_profit: Some(0.01),
        };

        let decision = session.resolve_exit(&ctx, false);
        assert!(decision.exit);
        assert_eq!(decision.reason, Some(ExitReason::StopLoss));
    }
}
