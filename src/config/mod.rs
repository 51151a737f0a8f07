//! Session configuration.
//!
//! Loaded once per evaluation session from an optional TOML/JSON file layered
//! under `MOMENTUM__SECTION__KEY` environment overrides, validated, and then
//! shared read-only for the lifetime of the session.

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::exits::roi::RoiTable;

/// Which strategy implementation a session evaluates
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Momentum,
}

/// Volatility proxy used for leverage and stake scaling
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityMeasure {
    /// ATR divided by close
    #[default]
    NormalizedAtr,
    /// (upper - lower) / middle Bollinger band
    BollingerWidth,
    /// Larger of NATR and band width
    Max,
    /// Sample std of close-to-close returns
    ReturnsStd,
    /// (highest high - lowest low) / close over `range_period` candles
    RangeRatio,
    /// Larger of returns std and range ratio
    Combined,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub adx_period: usize,
    pub atr_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub stoch_k_period: usize,
    pub stoch_slowk_period: usize,
    pub stoch_slowd_period: usize,
    pub williams_r_period: usize,
    pub cci_period: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub volume_window: usize,
    /// Volume spike when volume > rolling mean * factor
    pub volume_spike_factor: f64,
    /// k in close[t] / close[t-k] - 1
    pub momentum_lookback: usize,
    /// Returns in the rolling standard deviation
    pub returns_std_period: usize,
    /// Candles in the high-low range ratio
    pub range_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast_period: 20,
            ema_slow_period: 50,
            adx_period: 14,
            atr_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            stoch_k_period: 14,
            stoch_slowk_period: 3,
            stoch_slowd_period: 3,
            williams_r_period: 14,
            cci_period: 14,
            bb_period: 20,
            bb_std_dev: 2.0,
            volume_window: 20,
            volume_spike_factor: 1.5,
            momentum_lookback: 5,
            returns_std_period: 20,
            range_period: 14,
        }
    }
}

impl IndicatorConfig {
    /// Index of the first row at which every indicator is defined
    pub fn startup_candle_count(&self) -> usize {
        [
            self.ema_fast_period.saturating_sub(1),
            self.ema_slow_period.saturating_sub(1),
            (2 * self.adx_period).saturating_sub(1),
            self.atr_period,
            (self.macd_slow + self.macd_signal).saturating_sub(2),
            self.rsi_period,
            (self.stoch_k_period + self.stoch_slowk_period + self.stoch_slowd_period)
                .saturating_sub(3),
            self.williams_r_period.saturating_sub(1),
            self.cci_period.saturating_sub(1),
            self.bb_period.saturating_sub(1),
            self.volume_window.saturating_sub(1),
            self.momentum_lookback,
            self.returns_std_period,
            self.range_period.saturating_sub(1),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("ema_fast", self.ema_fast_period),
            ("ema_slow", self.ema_slow_period),
            ("adx", self.adx_period),
            ("atr", self.atr_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("rsi", self.rsi_period),
            ("stoch_k", self.stoch_k_period),
            ("stoch_slowk", self.stoch_slowk_period),
            ("stoch_slowd", self.stoch_slowd_period),
            ("williams_r", self.williams_r_period),
            ("cci", self.cci_period),
            ("bollinger", self.bb_period),
            ("volume_window", self.volume_window),
            ("momentum_lookback", self.momentum_lookback),
            ("returns_std", self.returns_std_period),
            ("range", self.range_period),
        ];
        for (name, period) in periods {
            if period == 0 {
                return Err(ConfigError::ZeroPeriod { name });
            }
        }

        if self.returns_std_period < 2 {
            return Err(invalid(
                "indicators.returns_std_period",
                "needs at least 2 returns",
            ));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::MacdPeriods {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        if !(self.bb_std_dev > 0.0) {
            return Err(invalid("indicators.bb_std_dev", "must be positive"));
        }
        if !(self.volume_spike_factor > 0.0) {
            return Err(invalid("indicators.volume_spike_factor", "must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalConfig {
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    /// ADX must exceed this for any entry
    pub adx_threshold: f64,
    pub stoch_overbought: f64,
    pub stoch_oversold: f64,
    /// Long entries need price_momentum above this, shorts below its negation
    pub min_momentum: f64,
    /// Adds the Stochastic/Williams %R/CCI/%b confirmations to entries and exits
    pub oscillator_confirmation: bool,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            adx_threshold: 25.0,
            stoch_overbought: 80.0,
            stoch_oversold: 20.0,
            min_momentum: 0.0,
            oscillator_confirmation: false,
        }
    }
}

impl SignalConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_levels("signals.rsi", self.rsi_oversold, self.rsi_overbought)?;
        check_levels("signals.stoch", self.stoch_oversold, self.stoch_overbought)?;
        if !(0.0..=100.0).contains(&self.adx_threshold) {
            return Err(invalid("signals.adx_threshold", "must be within 0..=100"));
        }
        if !self.min_momentum.is_finite() || self.min_momentum < 0.0 {
            return Err(invalid("signals.min_momentum", "must be a non-negative number"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskConfig {
    pub base_leverage: f64,
    pub min_leverage: f64,
    pub max_leverage: f64,
    pub volatility_measure: VolatilityMeasure,
    /// Volatility at which leverage is halved from base
    pub volatility_scale: f64,
    pub high_volatility_threshold: f64,
    /// Stake multiplier applied above the high-volatility threshold
    pub high_volatility_stake_factor: f64,
    pub base_stake: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            base_leverage: 10.0,
            min_leverage: 5.0,
            max_leverage: 20.0,
            volatility_measure: VolatilityMeasure::NormalizedAtr,
            volatility_scale: 0.05,
            high_volatility_threshold: 0.05,
            high_volatility_stake_factor: 0.5,
            base_stake: 100.0,
        }
    }
}

impl RiskConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_leverage > 0.0) || !(self.base_leverage > 0.0) {
            return Err(ConfigError::NonPositiveLeverage {
                min: self.min_leverage,
                base: self.base_leverage,
            });
        }
        if !(self.min_leverage <= self.max_leverage) {
            return Err(ConfigError::LeverageRange {
                min: self.min_leverage,
                max: self.max_leverage,
            });
        }
        if !(self.volatility_scale > 0.0) {
            return Err(invalid("risk.volatility_scale", "must be positive"));
        }
        if !(self.high_volatility_threshold >= 0.0) {
            return Err(invalid("risk.high_volatility_threshold", "must be non-negative"));
        }
        if !(self.high_volatility_stake_factor > 0.0 && self.high_volatility_stake_factor <= 1.0) {
            return Err(invalid(
                "risk.high_volatility_stake_factor",
                "must be within (0, 1]",
            ));
        }
        if !(self.base_stake > 0.0) {
            return Err(invalid("risk.base_stake", "must be positive"));
        }
        Ok(())
    }
}

/// Stop tier: once peak profit reaches `min_profit`, exit on a retrace of `distance`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProfitLockTier {
    pub min_profit: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExitConfig {
    pub minimal_roi: RoiTable,
    /// Hard stop as a (negative) profit fraction
    pub stoploss: f64,
    pub trailing_stop: bool,
    /// Retrace from peak that triggers the trailing stop once the offset is reached
    pub trailing_stop_positive: f64,
    /// Peak profit required before the positive trailing distance applies
    pub trailing_stop_positive_offset: f64,
    pub trailing_only_offset_is_reached: bool,
    pub use_custom_stoploss: bool,
    /// Minutes after entry during which only the static stoploss applies
    pub custom_stop_grace_minutes: i64,
    pub profit_lock_tiers: Vec<ProfitLockTier>,
    pub use_exit_signal: bool,
    pub exit_profit_only: bool,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            minimal_roi: RoiTable::default(),
            stoploss: -0.10,
            trailing_stop: true,
            trailing_stop_positive: 0.01,
            trailing_stop_positive_offset: 0.02,
            trailing_only_offset_is_reached: true,
            use_custom_stoploss: true,
            custom_stop_grace_minutes: 10,
            profit_lock_tiers: vec![
                ProfitLockTier {
                    min_profit: 0.02,
                    distance: 0.02,
                },
                ProfitLockTier {
                    min_profit: 0.01,
                    distance: 0.015,
                },
            ],
            use_exit_signal: true,
            exit_profit_only: false,
        }
    }
}

impl ExitConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.stoploss < 0.0) {
            return Err(ConfigError::Stoploss(self.stoploss));
        }
        if !(self.trailing_stop_positive > 0.0) {
            return Err(invalid("exits.trailing_stop_positive", "must be positive"));
        }
        if !(self.trailing_stop_positive_offset >= 0.0) {
            return Err(invalid(
                "exits.trailing_stop_positive_offset",
                "must be non-negative",
            ));
        }
        if self.custom_stop_grace_minutes < 0 {
            return Err(invalid("exits.custom_stop_grace_minutes", "must be non-negative"));
        }
        for tier in &self.profit_lock_tiers {
            if !(tier.distance > 0.0) || !tier.min_profit.is_finite() {
                return Err(invalid(
                    "exits.profit_lock_tiers",
                    format!("bad tier {tier:?}"),
                ));
            }
        }
        Ok(())
    }
}

/// Immutable per-session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrategyConfig {
    pub strategy: StrategyKind,
    pub timeframe: String,
    pub indicators: IndicatorConfig,
    pub signals: SignalConfig,
    pub risk: RiskConfig,
    pub exits: ExitConfig,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Momentum,
            timeframe: "15m".to_string(),
            indicators: IndicatorConfig::default(),
            signals: SignalConfig::default(),
            risk: RiskConfig::default(),
            exits: ExitConfig::default(),
        }
    }
}

impl StrategyConfig {
    /// Load from an optional file plus `MOMENTUM__*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder.add_source(env_source()).build()?;
        Self::from_source(config)
    }

    /// Parse a TOML document (no environment overrides)
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_source(config)
    }

    fn from_source(config: Config) -> Result<Self, ConfigError> {
        let parsed: StrategyConfig = config.try_deserialize()?;
        parsed.validate()?;
        tracing::debug!(
            "Loaded {:?} config: timeframe={}, startup candles={}",
            parsed.strategy,
            parsed.timeframe,
            parsed.startup_candle_count()
        );
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate()?;
        self.signals.validate()?;
        self.risk.validate()?;
        self.exits.validate()?;
        Ok(())
    }

    pub fn startup_candle_count(&self) -> usize {
        self.indicators.startup_candle_count()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("MOMENTUM")
        .separator("__")
        .try_parsing(true)
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_levels(field: &'static str, low: f64, high: f64) -> Result<(), ConfigError> {
    let in_range = |v: f64| (0.0..=100.0).contains(&v);
    if !in_range(low) || !in_range(high) || low >= high {
        return Err(invalid(
            field,
            format!("oversold {low} must be below overbought {high}, both within 0..=100"),
        ));
    }
    Ok(())
}
