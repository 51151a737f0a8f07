// Risk Parameterizer: leverage and stake from indicator state
pub mod sizing;

pub use sizing::{leverage_for_volatility, stake_for_volatility, StakeBounds};

use crate::config::{RiskConfig, VolatilityMeasure};
use crate::indicators::IndicatorRow;
use crate::models::{PositionContext, RiskParameters};

fn larger(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Volatility proxy for a row, `None` while the underlying indicator is warming up
///
/// `Max` and `Combined` fall back to whichever measure is defined.
pub fn volatility(row: &IndicatorRow, measure: VolatilityMeasure) -> Option<f64> {
    match measure {
        VolatilityMeasure::NormalizedAtr => row.natr,
        VolatilityMeasure::BollingerWidth => row.bb_width,
        VolatilityMeasure::Max => larger(row.natr, row.bb_width),
        VolatilityMeasure::ReturnsStd => row.returns_std,
        VolatilityMeasure::RangeRatio => row.range_ratio,
        VolatilityMeasure::Combined => larger(row.returns_std, row.range_ratio),
    }
    .filter(|v| v.is_finite())
}

/// Apply the host's (exchange) leverage limit after the configured clamp
///
/// Non-positive or non-finite caps are ignored.
pub fn apply_leverage_cap(leverage: f64, cap: Option<f64>) -> f64 {
    match cap {
        Some(cap) if cap.is_finite() && cap > 0.0 => leverage.min(cap),
        Some(cap) => {
            tracing::warn!("Ignoring invalid host leverage cap {}", cap);
            leverage
        }
        None => leverage,
    }
}

/// Leverage and stake for an entry decided on `row`
///
/// Stateless: the same row and config always give the same answer. With
/// undefined volatility the base leverage (clamped) and unreduced stake apply.
/// `leverage_cap` is the host's own limit for the pair and may pull leverage
/// below `min_leverage`.
pub fn compute_risk(
    row: &IndicatorRow,
    position: Option<&PositionContext>,
    cfg: &RiskConfig,
    bounds: &StakeBounds,
    leverage_cap: Option<f64>,
) -> RiskParameters {
    let vol = volatility(row, cfg.volatility_measure);

    let leverage = match vol {
        Some(v) => leverage_for_volatility(v, cfg),
        None => sizing::clamp_leverage(cfg.base_leverage, cfg),
    };
    let leverage = apply_leverage_cap(leverage, leverage_cap);
    let stake_amount = stake_for_volatility(vol, cfg, bounds);

    match position {
        Some(pos) => tracing::info!(
            "{} {} risk: leverage {:.2}x, stake {:.2} (volatility {:?})",
            pos.pair,
            pos.direction,
            leverage,
            stake_amount,
            vol
        ),
        None => tracing::info!(
            "{} entry risk: leverage {:.2}x, stake {:.2} (volatility {:?})",
            row.timestamp,
            leverage,
            stake_amount,
            vol
        ),
    }

    RiskParameters {
        leverage,
        stake_amount,
        volatility: vol,
    }
}
