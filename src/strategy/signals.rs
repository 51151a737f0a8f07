//! Signal Evaluator: multi-confirmation entry and exit rules over indicator rows.
//!
//! Every gate treats an undefined indicator as "not satisfied". Crossovers
//! need two consecutive rows with both lines defined.

use std::cmp::Ordering;

use crate::config::SignalConfig;
use crate::indicators::IndicatorRow;
use crate::models::SignalRow;

pub const ENTER_TAG_LONG: &str = "macd_cross_long";
pub const ENTER_TAG_SHORT: &str = "macd_cross_short";

/// Momentum exit level when oscillator confirmation is on
const MOMENTUM_EXIT_THRESHOLD: f64 = 0.02;
const WILLIAMS_OVERBOUGHT: f64 = -20.0;
const WILLIAMS_OVERSOLD: f64 = -80.0;
const CCI_OVERBOUGHT: f64 = 100.0;
const CCI_OVERSOLD: f64 = -100.0;
const BB_PERCENT_HIGH: f64 = 0.8;
const BB_PERCENT_LOW: f64 = 0.2;
const BB_PERCENT_EXIT_HIGH: f64 = 0.9;
const BB_PERCENT_EXIT_LOW: f64 = 0.1;

fn above(value: Option<f64>, level: f64) -> bool {
    value.is_some_and(|v| v > level)
}

fn below(value: Option<f64>, level: f64) -> bool {
    value.is_some_and(|v| v < level)
}

/// `line` moved from at-or-below `signal` to strictly above it
///
/// Each argument is a `(line, signal)` pair for the previous and current row.
pub fn crossed_above(prev: (Option<f64>, Option<f64>), cur: (Option<f64>, Option<f64>)) -> bool {
    match (prev, cur) {
        ((Some(pl), Some(ps)), (Some(cl), Some(cs))) => pl <= ps && cl > cs,
        _ => false,
    }
}

/// `line` moved from at-or-above `signal` to strictly below it
pub fn crossed_below(prev: (Option<f64>, Option<f64>), cur: (Option<f64>, Option<f64>)) -> bool {
    match (prev, cur) {
        ((Some(pl), Some(ps)), (Some(cl), Some(cs))) => pl >= ps && cl < cs,
        _ => false,
    }
}

fn macd_pair(row: &IndicatorRow) -> (Option<f64>, Option<f64>) {
    (row.macd, row.macd_signal)
}

fn macd_crossed_above(prev: Option<&IndicatorRow>, row: &IndicatorRow) -> bool {
    prev.is_some_and(|p| crossed_above(macd_pair(p), macd_pair(row)))
}

fn macd_crossed_below(prev: Option<&IndicatorRow>, row: &IndicatorRow) -> bool {
    prev.is_some_and(|p| crossed_below(macd_pair(p), macd_pair(row)))
}

fn close_vs(row: &IndicatorRow, level: Option<f64>) -> Option<Ordering> {
    row.close?.partial_cmp(&level?)
}

fn long_entry(prev: Option<&IndicatorRow>, row: &IndicatorRow, cfg: &SignalConfig) -> bool {
    let conditions = [
        macd_crossed_above(prev, row),
        row.volume_spike,
        close_vs(row, row.ema_fast) == Some(Ordering::Greater),
        below(row.rsi, cfg.rsi_overbought),
        above(row.adx, cfg.adx_threshold),
        above(row.price_momentum, cfg.min_momentum),
    ];
    if !conditions.iter().all(|&c| c) {
        return false;
    }

    if cfg.oscillator_confirmation {
        let oscillators = [
            below(row.stoch_k, cfg.stoch_overbought),
            below(row.stoch_d, cfg.stoch_overbought),
            below(row.williams_r, WILLIAMS_OVERBOUGHT),
            below(row.cci, CCI_OVERBOUGHT),
            below(row.bb_percent, BB_PERCENT_HIGH),
            above(row.rsi, cfg.rsi_oversold),
        ];
        return oscillators.iter().all(|&c| c);
    }

    true
}

fn short_entry(prev: Option<&IndicatorRow>, row: &IndicatorRow, cfg: &SignalConfig) -> bool {
    let conditions = [
        macd_crossed_below(prev, row),
        row.volume_spike,
        close_vs(row, row.ema_fast) == Some(Ordering::Less),
        above(row.rsi, cfg.rsi_oversold),
        above(row.adx, cfg.adx_threshold),
        below(row.price_momentum, -cfg.min_momentum),
    ];
    if !conditions.iter().all(|&c| c) {
        return false;
    }

    if cfg.oscillator_confirmation {
        let oscillators = [
            above(row.stoch_k, cfg.stoch_oversold),
            above(row.stoch_d, cfg.stoch_oversold),
            above(row.williams_r, WILLIAMS_OVERSOLD),
            above(row.cci, CCI_OVERSOLD),
            above(row.bb_percent, BB_PERCENT_LOW),
            below(row.rsi, cfg.rsi_overbought),
        ];
        return oscillators.iter().all(|&c| c);
    }

    true
}

fn long_exit(prev: Option<&IndicatorRow>, row: &IndicatorRow, cfg: &SignalConfig) -> bool {
    let touched_upper = matches!(
        close_vs(row, row.bb_upper),
        Some(Ordering::Greater | Ordering::Equal)
    );
    let mut conditions = vec![
        macd_crossed_below(prev, row),
        above(row.rsi, cfg.rsi_overbought),
        touched_upper,
        above(row.stoch_k, cfg.stoch_overbought),
    ];
    if cfg.oscillator_confirmation {
        conditions.extend([
            above(row.stoch_d, cfg.stoch_overbought),
            above(row.cci, CCI_OVERBOUGHT),
            above(row.bb_percent, BB_PERCENT_EXIT_HIGH),
            below(row.price_momentum, -MOMENTUM_EXIT_THRESHOLD),
        ]);
    }
    conditions.iter().any(|&c| c)
}

fn short_exit(prev: Option<&IndicatorRow>, row: &IndicatorRow, cfg: &SignalConfig) -> bool {
    let touched_lower = matches!(
        close_vs(row, row.bb_lower),
        Some(Ordering::Less | Ordering::Equal)
    );
    let mut conditions = vec![
        macd_crossed_above(prev, row),
        below(row.rsi, cfg.rsi_oversold),
        touched_lower,
        below(row.stoch_k, cfg.stoch_oversold),
    ];
    if cfg.oscillator_confirmation {
        conditions.extend([
            below(row.stoch_d, cfg.stoch_oversold),
            below(row.cci, CCI_OVERSOLD),
            below(row.bb_percent, BB_PERCENT_EXIT_LOW),
            above(row.price_momentum, MOMENTUM_EXIT_THRESHOLD),
        ]);
    }
    conditions.iter().any(|&c| c)
}

fn previous(rows: &[IndicatorRow], i: usize) -> Option<&IndicatorRow> {
    i.checked_sub(1).map(|p| &rows[p])
}

/// Raw `(enter_long, enter_short)` per row, before exit precedence
pub fn evaluate_entries(rows: &[IndicatorRow], cfg: &SignalConfig) -> Vec<(bool, bool)> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let prev = previous(rows, i);
            (long_entry(prev, row, cfg), short_entry(prev, row, cfg))
        })
        .collect()
}

/// `(exit_long, exit_short)` per row
pub fn evaluate_exits(rows: &[IndicatorRow], cfg: &SignalConfig) -> Vec<(bool, bool)> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let prev = previous(rows, i);
            (long_exit(prev, row, cfg), short_exit(prev, row, cfg))
        })
        .collect()
}

/// Combine entries and exits into signal rows
///
/// Within one direction an exit suppresses an entry on the same row. Opposite
/// directions are evaluated independently and never netted.
pub fn evaluate_signals(rows: &[IndicatorRow], cfg: &SignalConfig) -> Vec<SignalRow> {
    let entries = evaluate_entries(rows, cfg);
    let exits = evaluate_exits(rows, cfg);

    rows.iter()
        .zip(entries.into_iter().zip(exits))
        .map(|(row, ((raw_long, raw_short), (exit_long, exit_short)))| {
            let enter_long = raw_long && !exit_long;
            let enter_short = raw_short && !exit_short;

            if raw_long && exit_long {
                tracing::debug!("{} long entry suppressed by long exit", row.timestamp);
            }
            if raw_short && exit_short {
                tracing::debug!("{} short entry suppressed by short exit", row.timestamp);
            }
            if enter_long || enter_short {
                tracing::debug!(
                    "{} ENTRY long={} short={} | MACD={:?} signal={:?} RSI={:?} ADX={:?} vol_ratio={:?} momentum={:?}",
                    row.timestamp,
                    enter_long,
                    enter_short,
                    row.macd,
                    row.macd_signal,
                    row.rsi,
                    row.adx,
                    row.volume_ratio,
                    row.price_momentum
                );
            }

            let enter_tag = if enter_long {
                Some(ENTER_TAG_LONG.to_string())
            } else if enter_short {
                Some(ENTER_TAG_SHORT.to_string())
            } else {
                None
            };

            SignalRow {
                timestamp: row.timestamp,
                enter_long,
                enter_short,
                exit_long,
                exit_short,
                enter_tag,
            }
        })
        .collect()
}
