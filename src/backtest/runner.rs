use crate::backtest::metrics::{BacktestMetrics, TradeRecord};
use crate::error::DataError;
use crate::models::{validate_candles, Candle, Direction, PairMetadata, PositionContext};
use crate::risk::StakeBounds;
use crate::session::{AnalyzedFrame, EvaluationSession};
use chrono::{DateTime, Utc};

/// Position held by the simulated host
struct OpenTrade {
    direction: Direction,
    enter_tag: Option<String>,
    entry_time: DateTime<Utc>,
    entry_price: f64,
    leverage: f64,
    stake_amount: f64,
    peak_profit: Option<f64>,
}

impl OpenTrade {
    /// Leveraged, direction-adjusted profit at `price`
    fn profit_at(&self, price: f64) -> f64 {
        let change = price / self.entry_price - 1.0;
        let directed = match self.direction {
            Direction::Long => change,
            Direction::Short => -change,
        };
        directed * self.leverage
    }
}

/// Backtest runner that plays the host's role over historical candles
///
/// One position at a time, entries and exits filled at the candle close.
/// When both entries fire on one row the long side is taken and the row is
/// counted as a conflict.
#[derive(Debug, Clone, Default)]
pub struct BacktestRunner {
    leverage_cap: Option<f64>,
}

impl BacktestRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exchange leverage limit passed to the strategy on every entry
    pub fn with_leverage_cap(mut self, leverage_cap: f64) -> Self {
        self.leverage_cap = Some(leverage_cap);
        self
    }

    /// Run a backtest over `candles` with the session's strategy
    ///
    /// # Returns
    /// BacktestMetrics with performance data, or a `DataError` for unordered
    /// candles or a series too short to ever produce a complete indicator row
    pub fn run(
        &self,
        session: &EvaluationSession,
        candles: &[Candle],
        metadata: &PairMetadata,
        bounds: &StakeBounds,
    ) -> Result<BacktestMetrics, DataError> {
        validate_candles(candles)?;

        let needed = session.startup_candle_count() + 1;
        if candles.len() < needed {
            return Err(DataError::Insufficient {
                got: candles.len(),
                needed,
            });
        }

        tracing::info!(
            "Starting backtest: {} {} candles for {}, strategy needs {}",
            candles.len(),
            metadata.timeframe,
            metadata.pair,
            needed
        );

        let frame = session.analyze(candles, metadata);
        let metrics = self.simulate(session, candles, &frame, metadata, bounds);
        tracing::info!(
            "Backtest complete: {} trades, win rate {:.1}%, profit {:.2}",
            metrics.total_trades,
            metrics.win_rate,
            metrics.total_profit
        );

        Ok(metrics)
    }

    /// Walk an analyzed frame candle by candle, playing the host
    fn simulate(
        &self,
        session: &EvaluationSession,
        candles: &[Candle],
        frame: &AnalyzedFrame,
        metadata: &PairMetadata,
        bounds: &StakeBounds,
    ) -> BacktestMetrics {
        let mut open: Option<OpenTrade> = None;
        let mut trades = Vec::new();
        let mut entry_conflicts = 0;

        for (i, candle) in candles.iter().enumerate() {
            let signal = &frame.signals[i];

            // Check exits on the open position FIRST
            if let Some(trade) = open.as_mut() {
                let ctx = PositionContext {
                    pair: metadata.pair.clone(),
                    direction: trade.direction,
                    entry_price: trade.entry_price,
                    entry_time: trade.entry_time,
                    current_price: candle.close,
                    current_time: candle.timestamp,
                    current_profit: trade.profit_at(candle.close),
                    peak_profit: trade.peak_profit,
                };

                let decision = session.resolve_exit(&ctx, signal.exit(trade.direction));
                trade.peak_profit = Some(decision.peak_profit);

                if let (true, Some(reason)) = (decision.exit, decision.reason) {
                    let profit_ratio = ctx.current_profit;
                    tracing::debug!(
                        "Closed {} @ {:.4}: {:+.2}% ({})",
                        trade.direction,
                        candle.close,
                        profit_ratio * 100.0,
                        reason
                    );
                    trades.push(TradeRecord {
                        pair: metadata.pair.clone(),
                        direction: trade.direction,
                        enter_tag: trade.enter_tag.take(),
                        entry_time: trade.entry_time,
                        exit_time: candle.timestamp,
                        entry_price: trade.entry_price,
                        exit_price: candle.close,
                        leverage: trade.leverage,
                        stake_amount: trade.stake_amount,
                        profit_ratio,
                        profit_abs: trade.stake_amount * profit_ratio,
                        holding_period_minutes: ctx.elapsed_minutes(),
                        exit_reason: reason,
                    });
                    open = None;
                }
                continue;
            }

            let direction = match (
                signal.entry(Direction::Long),
                signal.entry(Direction::Short),
            ) {
                (true, true) => {
                    entry_conflicts += 1;
                    tracing::debug!("{} both entries fired, taking long", candle.timestamp);
                    Direction::Long
                }
                (true, false) => Direction::Long,
                (false, true) => Direction::Short,
                (false, false) => continue,
            };

            let risk = session.strategy().compute_risk(
                &frame.indicators[i],
                None,
                bounds,
                self.leverage_cap,
            );
            tracing::debug!(
                "Opened {} @ {:.4}, leverage {:.2}x, stake {:.2}",
                direction,
                candle.close,
                risk.leverage,
                risk.stake_amount
            );

            open = Some(OpenTrade {
                direction,
                enter_tag: signal.enter_tag.clone(),
                entry_time: candle.timestamp,
                entry_price: candle.close,
                leverage: risk.leverage,
                stake_amount: risk.stake_amount,
                peak_profit: None,
            });
        }

        if let Some(trade) = open {
            tracing::debug!(
                "Position opened at {} still open at end of data, not counted",
                trade.entry_time
            );
        }

        BacktestMetrics::from_trades(trades, entry_conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::synthetic::{MarketScenario, SyntheticDataGenerator};
    use crate::config::StrategyConfig;
    use crate::models::ExitReason;
    use crate::strategy::signals::ENTER_TAG_LONG;
    use chrono::TimeZone;

    fn session() -> EvaluationSession {
        EvaluationSession::new(StrategyConfig::default()).unwrap()
    }

    fn bounds() -> StakeBounds {
        StakeBounds::new(10.0, 1_000.0).unwrap()
    }

    fn metadata() -> PairMetadata {
        PairMetadata::new("BTC/USDT", "15m")
    }

    /// First MACD golden cross with volume lands on candle 35
    fn pullback_candles(count: usize) -> Vec<Candle> {
        SyntheticDataGenerator::new(0)
            .with_base_price(100.0)
            .generate(MarketScenario::Pullbacks, count, 15)
    }

    #[test]
    fn test_profit_direction_and_leverage() {
        let entry_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut trade = OpenTrade {
            direction: Direction::Long,
            enter_tag: None,
            entry_time,
            entry_price: 100.0,
            leverage: 10.0,
            stake_amount: 100.0,
            peak_profit: None,
        };
        assert!((trade.profit_at(101.0) - 0.10).abs() < 1e-9);

        trade.direction = Direction::Short;
        assert!((trade.profit_at(101.0) + 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_insufficient_data() {
        let candles = SyntheticDataGenerator::new(1).generate(MarketScenario::Uptrend, 20, 15);
        let result = BacktestRunner::new().run(&session(), &candles, &metadata(), &bounds());

        assert_eq!(result, Err(DataError::Insufficient { got: 20, needed: 50 }));
    }

    #[test]
    fn test_rejects_unsorted_candles() {
        let mut candles = SyntheticDataGenerator::new(1).generate(MarketScenario::Uptrend, 100, 15);
        candles.swap(10, 11);
        let result = BacktestRunner::new().run(&session(), &candles, &metadata(), &bounds());

        assert!(matches!(result, Err(DataError::Unsorted { index: 11, .. })));
    }

    #[test]
    fn test_single_trade_exits_on_roi() {
        let candles = pullback_candles(40);
        let metrics = BacktestRunner::new()
            .run(&session(), &candles, &metadata(), &bounds())
            .unwrap();

        assert_eq!(metrics.total_trades, 1);
        assert_eq!(metrics.entry_conflicts, 0);
        assert_eq!(metrics.exit_reasons.get("roi_target"), Some(&1));

        let trade = &metrics.trades[0];
        assert_eq!(trade.direction, Direction::Long);
        assert_eq!(trade.enter_tag.as_deref(), Some(ENTER_TAG_LONG));
        assert_eq!(trade.entry_time, candles[35].timestamp);
        assert_eq!(trade.exit_time, candles[36].timestamp);
        assert_eq!(trade.holding_period_minutes, 15);
        assert_eq!(trade.exit_reason, ExitReason::RoiTarget);

        // +0.48% price move at ~8.6x leverage clears the 4% breakpoint
        assert!(trade.leverage > 8.5 && trade.leverage < 8.8, "{}", trade.leverage);
        let price_change = candles[36].close / candles[35].close - 1.0;
        assert!((trade.profit_ratio - price_change * trade.leverage).abs() < 1e-12);
        assert!(trade.profit_ratio > 0.04 && trade.profit_ratio < 0.045);
        assert_eq!(trade.stake_amount, 100.0);
        assert!((trade.profit_abs - 100.0 * trade.profit_ratio).abs() < 1e-9);
        assert_eq!(metrics.winning_trades, 1);
    }

    #[test]
    fn test_leverage_cap_applies_to_entries() {
        let candles = pullback_candles(40);
        let metrics = BacktestRunner::new()
            .with_leverage_cap(4.0)
            .run(&session(), &candles, &metadata(), &bounds())
            .unwrap();

        // At 4x the same move no longer reaches 4%; the exit signal closes it
        assert_eq!(metrics.total_trades, 1);
        let trade = &metrics.trades[0];
        assert_eq!(trade.leverage, 4.0);
        assert_eq!(trade.exit_reason, ExitReason::ExitSignal);
        assert!(trade.profit_ratio > 0.015 && trade.profit_ratio < 0.02);
    }

    #[test]
    fn test_trades_respect_risk_bounds() {
        let candles = pullback_candles(300);
        let metrics = BacktestRunner::new()
            .run(&session(), &candles, &metadata(), &bounds())
            .unwrap();

        assert!(metrics.total_trades > 20, "{} trades", metrics.total_trades);
        for trade in &metrics.trades {
            assert!((5.0..=20.0).contains(&trade.leverage));
            assert!((10.0..=1_000.0).contains(&trade.stake_amount));
            assert!(trade.exit_time > trade.entry_time);
            assert!(trade.profit_ratio > 0.0);
        }
        let counted: usize = metrics.exit_reasons.values().sum();
        assert_eq!(counted, metrics.total_trades);
    }

    #[test]
    fn test_conflicting_entries_take_long() {
        let session = session();
        let candles = pullback_candles(40);
        let mut frame = session.analyze(&candles, &metadata());
        assert!(frame.signals[35].entry(Direction::Long));
        frame.signals[35].enter_short = true;

        let metrics =
            BacktestRunner::new().simulate(&session, &candles, &frame, &metadata(), &bounds());

        assert_eq!(metrics.entry_conflicts, 1);
        assert_eq!(metrics.total_trades, 1);
        assert_eq!(metrics.trades[0].direction, Direction::Long);
    }

    #[test]
    fn test_short_trade_profit_and_peak_tracking() {
        let session = session();
        let candles = pullback_candles(48);
        let mut frame = session.analyze(&candles, &metadata());
        // Short opened on the second pullback candle, then price keeps falling
        frame.signals[38].enter_short = true;
        frame.signals[38].enter_tag = Some("manual_short".to_string());

        let metrics =
            BacktestRunner::new().simulate(&session, &candles, &frame, &metadata(), &bounds());

        let short = metrics
            .trades
            .iter()
            .find(|t| t.direction == Direction::Short)
            .unwrap();
        assert_eq!(short.enter_tag.as_deref(), Some("manual_short"));
        assert_eq!(short.entry_time, candles[38].timestamp);
        // 2.5% after one candle is short of the 4% breakpoint, 5% after two is not
        assert_eq!(short.exit_time, candles[40].timestamp);
        assert_eq!(short.exit_reason, ExitReason::RoiTarget);
        let price_change = short.exit_price / short.entry_price - 1.0;
        assert!(price_change < 0.0);
        assert!((short.profit_ratio + price_change * short.leverage).abs() < 1e-12);
        assert!(short.profit_ratio > 0.04);
    }
}
