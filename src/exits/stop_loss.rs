//! Static stoploss and the tiered profit-lock stop.
//!
//! The static stop is a plain profit floor. The profit-lock stop only applies
//! after a grace period: once peak profit has cleared a tier's `min_profit`,
//! the position exits if profit falls back to `peak - distance`.

use crate::config::{ExitConfig, ProfitLockTier};
use crate::models::PositionContext;

/// Static stop: profit at or below the configured (negative) fraction
pub fn stoploss_hit(current_profit: f64, cfg: &ExitConfig) -> bool {
    current_profit <= cfg.stoploss
}

/// Highest tier whose `min_profit` the given profit has exceeded
fn active_tier(tiers: &[ProfitLockTier], profit: f64) -> Option<&ProfitLockTier> {
    tiers
        .iter()
        .filter(|t| profit > t.min_profit)
        .max_by(|a, b| a.min_profit.total_cmp(&b.min_profit))
}

fn in_grace_period(ctx: &PositionContext, cfg: &ExitConfig) -> bool {
    ctx.elapsed_minutes() < cfg.custom_stop_grace_minutes
}

/// Stop distance relative to the current rate, for hosts that place their own
/// stop orders. Always negative: -0.02 means "2% away from the current price".
///
/// Falls back to the static stoploss during the grace period or while no tier
/// is reached.
pub fn custom_stoploss(ctx: &PositionContext, cfg: &ExitConfig) -> f64 {
    if !cfg.use_custom_stoploss || in_grace_period(ctx, cfg) {
        return cfg.stoploss;
    }

    match active_tier(&cfg.profit_lock_tiers, ctx.current_profit) {
        Some(tier) => -tier.distance,
        None => cfg.stoploss,
    }
}

/// Profit-lock exit based on the peak profit since entry
pub fn profit_lock_hit(ctx: &PositionContext, peak_profit: f64, cfg: &ExitConfig) -> bool {
    if !cfg.use_custom_stoploss || in_grace_period(ctx, cfg) {
        return false;
    }

    match active_tier(&cfg.profit_lock_tiers, peak_profit) {
        Some(tier) => ctx.current_profit <= peak_profit - tier.distance,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::{Duration, TimeZone, Utc};

    fn position(direction: Direction, minutes_open: i64, profit: f64) -> PositionContext {
        let entry_time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        PositionContext {
            pair: "BTC/USDT".to_string(),
            direction,
            entry_price: 100.0,
            entry_time,
            current_price: 100.0,
            current_time: entry_time + Duration::minutes(minutes_open),
            current_profit: profit,
            peak_profit: None,
        }
    }

    #[test]
    fn test_stoploss_boundary() {
        let cfg = ExitConfig::default();
        assert!(stoploss_hit(-0.10, &cfg));
        assert!(stoploss_hit(-0.11, &cfg));
        assert!(!stoploss_hit(-0.09, &cfg));
    }

    #[test]
    fn test_custom_stoploss_tiers() {
        let cfg = ExitConfig::default();

        assert_eq!(custom_stoploss(&position(Direction::Long, 15, 0.03), &cfg), -0.02);
        assert_eq!(custom_stoploss(&position(Direction::Long, 15, 0.015), &cfg), -0.015);
        assert_eq!(custom_stoploss(&position(Direction::Long, 15, 0.005), &cfg), -0.10);
    }

    #[test]
    fn test_custom_stoploss_same_for_shorts() {
        let cfg = ExitConfig::default();
        assert_eq!(custom_stoploss(&position(Direction::Short, 15, 0.03), &cfg), -0.02);
    }

    #[test]
    fn test_custom_stoploss_grace_period() {
        let cfg = ExitConfig::default();
        // Only 5 minutes in: static stoploss regardless of profit
        assert_eq!(custom_stoploss(&position(Direction::Long, 5, 0.03), &cfg), -0.10);
    }

    #[test]
    fn test_profit_lock_fires_on_retrace() {
        let cfg = ExitConfig::default();
        let ctx = position(Direction::Long, 20, 0.012);

        // Peak 3% -> tier (0.02, 0.02) -> lock at 1%
        assert!(!profit_lock_hit(&ctx, 0.03, &cfg));

        let ctx = position(Direction::Long, 20, 0.009);
        assert!(profit_lock_hit(&ctx, 0.03, &cfg));
    }

    #[test]
    fn test_profit_lock_needs_tier() {
        let cfg = ExitConfig::default();
        let ctx = position(Direction::Long, 20, -0.05);
        // Peak never cleared 1%
        assert!(!profit_lock_hit(&ctx, 0.008, &cfg));
    }

    #[test]
    fn test_profit_lock_disabled() {
        let cfg = ExitConfig {
            use_custom_stoploss: false,
            ..Default::default()
        };
        let ctx = position(Direction::Long, 20, 0.0);
        assert!(!profit_lock_hit(&ctx, 0.05, &cfg));
        assert_eq!(custom_stoploss(&ctx, &cfg), cfg.stoploss);
    }
}
