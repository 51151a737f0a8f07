//! Forced exits for open positions, evaluated every tick independently of the
//! boolean exit signal.
//!
//! Priority order: Stoploss > Trailing Stop > ROI target > Profit lock (custom).
//! The boolean exit signal is only consulted when none of these fire.

pub mod roi;
pub mod stop_loss;
pub mod trailing;

pub use roi::{RoiStep, RoiTable};
pub use stop_loss::{custom_stoploss, profit_lock_hit, stoploss_hit};
pub use trailing::TrailingState;

use crate::config::ExitConfig;
use crate::models::{ExitDecision, ExitReason, PositionContext};

/// Decide whether to force-exit the position this tick
pub fn evaluate_forced_exit(ctx: &PositionContext, cfg: &ExitConfig) -> ExitDecision {
    let peak_profit = trailing::updated_peak(ctx);

    // Stoploss first, regardless of any other state
    if stoploss_hit(ctx.current_profit, cfg) {
        tracing::info!(
            "{} {} STOPLOSS: profit {:.2}% <= {:.2}%",
            ctx.pair,
            ctx.direction,
            ctx.current_profit * 100.0,
            cfg.stoploss * 100.0
        );
        return ExitDecision::exit(ExitReason::StopLoss, peak_profit);
    }

    let trailing = trailing::evaluate(ctx, cfg);
    if trailing.hit {
        tracing::info!(
            "{} {} TRAILING STOP: profit {:.2}% below stop {:.2}% (peak {:.2}%)",
            ctx.pair,
            ctx.direction,
            ctx.current_profit * 100.0,
            trailing.stop_profit.unwrap_or(f64::NAN) * 100.0,
            trailing.peak_profit * 100.0
        );
        return ExitDecision::exit(ExitReason::TrailingStop, peak_profit);
    }

    let elapsed = ctx.elapsed_minutes();
    if let Some(step) = cfg.minimal_roi.triggered(elapsed, ctx.current_profit) {
        tracing::info!(
            "{} {} ROI: profit {:.2}% >= {:.2}% after {} min (breakpoint {} min)",
            ctx.pair,
            ctx.direction,
            ctx.current_profit * 100.0,
            step.profit * 100.0,
            elapsed,
            step.minutes
        );
        return ExitDecision::exit(ExitReason::RoiTarget, peak_profit);
    }

    if profit_lock_hit(ctx, peak_profit, cfg) {
        tracing::info!(
            "{} {} PROFIT LOCK: profit {:.2}% retraced from peak {:.2}%",
            ctx.pair,
            ctx.direction,
            ctx.current_profit * 100.0,
            peak_profit * 100.0
        );
        return ExitDecision::exit(ExitReason::Custom, peak_profit);
    }

    ExitDecision::hold(peak_profit)
}

/// Forced exits first, then the strategy's boolean exit signal
pub fn resolve_exit(ctx: &PositionContext, exit_signal: bool, cfg: &ExitConfig) -> ExitDecision {
    let forced = evaluate_forced_exit(ctx, cfg);
    if forced.exit {
        return forced;
    }

    let signal_allowed = cfg.use_exit_signal && (!cfg.exit_profit_only || ctx.current_profit > 0.0);
    if exit_signal && signal_allowed {
        tracing::info!(
            "{} {} EXIT SIGNAL at profit {:.2}%",
            ctx.pair,
            ctx.direction,
            ctx.current_profit * 100.0
        );
        return ExitDecision::exit(ExitReason::ExitSignal, forced.peak_profit);
    }

    forced
}
