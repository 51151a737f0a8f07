//! Batch scoring of candidate configurations.
//!
//! An external optimizer proposes configs; this scores each one on the same
//! candles and reports invalid ones per entry instead of aborting the batch.

use anyhow::Context;
use serde::Serialize;

use crate::backtest::metrics::BacktestMetrics;
use crate::backtest::runner::BacktestRunner;
use crate::config::StrategyConfig;
use crate::models::{Candle, PairMetadata};
use crate::risk::StakeBounds;
use crate::session::EvaluationSession;

#[derive(Debug, Clone, Serialize)]
pub struct SweepEntry {
    /// Position of the config in the input list
    pub index: usize,
    pub metrics: Option<BacktestMetrics>,
    pub error: Option<String>,
}

impl SweepEntry {
    pub fn total_profit(&self) -> Option<f64> {
        self.metrics.as_ref().map(|m| m.total_profit)
    }
}

fn evaluate_one(
    config: StrategyConfig,
    candles: &[Candle],
    metadata: &PairMetadata,
    bounds: &StakeBounds,
) -> anyhow::Result<BacktestMetrics> {
    let session = EvaluationSession::new(config).context("invalid strategy config")?;
    let metrics = BacktestRunner::new()
        .run(&session, candles, metadata, bounds)
        .context("backtest failed")?;
    Ok(metrics)
}

/// Score every config on the same candles, in input order
pub fn evaluate_configs(
    candles: &[Candle],
    metadata: &PairMetadata,
    configs: Vec<StrategyConfig>,
    bounds: &StakeBounds,
) -> Vec<SweepEntry> {
    configs
        .into_iter()
        .enumerate()
        .map(|(index, config)| match evaluate_one(config, candles, metadata, bounds) {
            Ok(metrics) => SweepEntry {
                index,
                metrics: Some(metrics),
                error: None,
            },
            Err(e) => {
                tracing::warn!("Config #{} skipped: {:#}", index, e);
                SweepEntry {
                    index,
                    metrics: None,
                    error: Some(format!("{e:#}")),
                }
            }
        })
        .collect()
}

/// Successful entries sorted by total profit, best first
pub fn rank_by_profit(entries: &[SweepEntry]) -> Vec<&SweepEntry> {
    let mut ranked: Vec<&SweepEntry> = entries.iter().filter(|e| e.metrics.is_some()).collect();
    ranked.sort_by(|a, b| {
        let pa = a.total_profit().unwrap_or(f64::NEG_INFINITY);
        let pb = b.total_profit().unwrap_or(f64::NEG_INFINITY);
        pb.total_cmp(&pa)
    });
    ranked
}
