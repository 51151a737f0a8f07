//! Trailing stop on profit fraction.
//!
//! The peak profit is owned by the host: it comes in through
//! `PositionContext::peak_profit` and the updated value goes back out in the
//! exit decision. Nothing here mutates the position.
//!
//! Activation: peak profit > `trailing_stop_positive_offset`. From then on the
//! stop sits `trailing_stop_positive` below the peak. When
//! `trailing_only_offset_is_reached` is false the stop also trails before
//! activation, at the static stoploss distance.

use crate::config::ExitConfig;
use crate::models::PositionContext;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingState {
    /// Peak profit including the current tick
    pub peak_profit: f64,
    /// Profit level at which the stop fires, `None` when inactive
    pub stop_profit: Option<f64>,
    pub hit: bool,
}

/// Peak profit including the current tick
pub fn updated_peak(ctx: &PositionContext) -> f64 {
    match ctx.peak_profit {
        Some(peak) if peak.is_finite() => peak.max(ctx.current_profit),
        _ => ctx.current_profit,
    }
}

pub fn evaluate(ctx: &PositionContext, cfg: &ExitConfig) -> TrailingState {
    let peak_profit = updated_peak(ctx);

    if !cfg.trailing_stop {
        return TrailingState {
            peak_profit,
            stop_profit: None,
            hit: false,
        };
    }

    let distance = if peak_profit > cfg.trailing_stop_positive_offset {
        Some(cfg.trailing_stop_positive)
    } else if !cfg.trailing_only_offset_is_reached {
        Some(cfg.stoploss.abs())
    } else {
        None
    };

    let stop_profit = distance.map(|d| peak_profit - d);
    let hit = stop_profit.is_some_and(|stop| ctx.current_profit < stop);

    TrailingState {
        peak_profit,
        stop_profit,
        hit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::{Duration, TimeZone, Utc};

    fn position(profit: f64, peak: Option<f64>) -> PositionContext {
        let entry_time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        PositionContext {
            pair: "ETH/USDT".to_string(),
            direction: Direction::Long,
            entry_price: 2000.0,
            entry_time,
            current_price: 2000.0 * (1.0 + profit),
            current_time: entry_time + Duration::minutes(20),
            current_profit: profit,
            peak_profit: peak,
        }
    }

    #[test]
    fn test_inactive_below_offset() {
        let cfg = ExitConfig::default();
        let state = evaluate(&position(0.005, Some(0.019)), &cfg);

        assert_eq!(state.stop_profit, None);
        assert!(!state.hit);
        assert_eq!(state.peak_profit, 0.019);
    }

    #[test]
    fn test_peak_tracks_current_profit() {
        let cfg = ExitConfig::default();
        let state = evaluate(&position(0.035, Some(0.03)), &cfg);

        assert_eq!(state.peak_profit, 0.035);
        assert!(!state.hit);
        assert!((state.stop_profit.unwrap() - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_fires_on_retrace_below_peak_minus_distance() {
        let cfg = ExitConfig::default();

        // Peak 4%, stop at 3%
        assert!(!evaluate(&position(0.031, Some(0.04)), &cfg).hit);
        assert!(evaluate(&position(0.029, Some(0.04)), &cfg).hit);
    }

    #[test]
    fn test_missing_peak_starts_from_current() {
        let cfg = ExitConfig::default();
        let state = evaluate(&position(0.025, None), &cfg);
        assert_eq!(state.peak_profit, 0.025);
        assert!(!state.hit);
    }

    #[test]
    fn test_trails_before_offset_when_allowed() {
        let cfg = ExitConfig {
            trailing_only_offset_is_reached: false,
            stoploss: -0.05,
            ..Default::default()
        };

        // Peak 1% (below offset), trailing at the 5% stoploss distance
        let state = evaluate(&position(-0.045, Some(0.01)), &cfg);
        assert!((state.stop_profit.unwrap() + 0.04).abs() < 1e-12);
        assert!(state.hit);
    }

    #[test]
    fn test_disabled() {
        let cfg = ExitConfig {
            trailing_stop: false,
            ..Default::default()
        };
        let state = evaluate(&position(0.0, Some(0.10)), &cfg);
        assert!(!state.hit);
        assert_eq!(state.stop_profit, None);
    }
}
