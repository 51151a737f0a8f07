use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::error::ConfigError;

/// Stake limits supplied by the host (exchange minimums, wallet balance)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StakeBounds {
    pub min_stake: f64,
    pub max_stake: f64,
}

impl StakeBounds {
    pub fn new(min_stake: f64, max_stake: f64) -> Result<Self, ConfigError> {
        let valid = min_stake.is_finite()
            && max_stake.is_finite()
            && min_stake >= 0.0
            && min_stake <= max_stake;
        if !valid {
            return Err(ConfigError::StakeBounds {
                min: min_stake,
                max: max_stake,
            });
        }
        Ok(Self {
            min_stake,
            max_stake,
        })
    }

    pub fn clamp(&self, stake: f64) -> f64 {
        stake.max(self.min_stake).min(self.max_stake)
    }
}

/// Leverage scaled inversely with volatility
///
/// `base / (1 + vol / volatility_scale)` clamped to `[min_leverage, max_leverage]`.
/// Continuous and non-increasing in `vol`. Negative volatility counts as zero;
/// NaN counts as extreme volatility.
pub fn leverage_for_volatility(vol: f64, cfg: &RiskConfig) -> f64 {
    if vol.is_nan() {
        return cfg.min_leverage;
    }
    let vol = vol.max(0.0);
    let raw = cfg.base_leverage / (1.0 + vol / cfg.volatility_scale);
    clamp_leverage(raw, cfg)
}

pub(crate) fn clamp_leverage(leverage: f64, cfg: &RiskConfig) -> f64 {
    leverage.max(cfg.min_leverage).min(cfg.max_leverage)
}

/// Base stake, cut by `high_volatility_stake_factor` above the high-volatility
/// threshold, then clamped to the host's bounds
pub fn stake_for_volatility(vol: Option<f64>, cfg: &RiskConfig, bounds: &StakeBounds) -> f64 {
    let high_volatility = vol.is_some_and(|v| v.is_nan() || v > cfg.high_volatility_threshold);
    let stake = if high_volatility {
        cfg.base_stake * cfg.high_volatility_stake_factor
    } else {
        cfg.base_stake
    };
    bounds.clamp(stake)
}
