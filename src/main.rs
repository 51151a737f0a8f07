//! Host-side harness: load a config, run the engine over a candle file or a
//! synthetic series, and print backtest metrics as JSON.

use anyhow::{bail, Context, Result};
use clap::Parser;
use momentum_engine::backtest::{BacktestRunner, MarketScenario, SyntheticDataGenerator};
use momentum_engine::{Candle, EvaluationSession, PairMetadata, StakeBounds, StrategyConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "momentum-engine",
    about = "Backtest the momentum futures strategy over historical or synthetic candles"
)]
struct Cli {
    /// Strategy config file (TOML or JSON). MOMENTUM__* env vars override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file with an array of candles.
    #[arg(long, conflicts_with = "synthetic", required_unless_present = "synthetic")]
    candles: Option<PathBuf>,

    /// Synthetic scenario: uptrend, downtrend, sideways, volatile, pullbacks.
    #[arg(long)]
    synthetic: Option<MarketScenario>,

    /// Number of synthetic candles.
    #[arg(long, default_value_t = 2_000)]
    count: usize,

    /// Seed for the synthetic generator.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value = "BTC/USDT")]
    pair: String,

    #[arg(long, default_value_t = 10.0)]
    min_stake: f64,

    #[arg(long, default_value_t = 1_000.0)]
    max_stake: f64,

    /// Exchange leverage limit for the pair.
    #[arg(long)]
    max_leverage: Option<f64>,

    /// Print a readable report instead of JSON.
    #[arg(long, default_value_t = false)]
    report: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();

    let config = StrategyConfig::load(cli.config.as_deref()).context("failed to load config")?;
    let timeframe = config.timeframe.clone();
    let session = EvaluationSession::new(config)?;
    let bounds = StakeBounds::new(cli.min_stake, cli.max_stake)?;
    let metadata = PairMetadata::new(cli.pair.as_str(), timeframe.as_str());

    let candles = match (&cli.candles, cli.synthetic) {
        (Some(path), _) => load_candles(path)?,
        (None, Some(scenario)) => {
            let interval = timeframe_minutes(&timeframe)
                .with_context(|| format!("unsupported timeframe {timeframe:?}"))?;
            tracing::info!(
                "Generating {} {} candles ({}, seed {})",
                cli.count,
                timeframe,
                scenario,
                cli.seed
            );
            SyntheticDataGenerator::new(cli.seed).generate(scenario, cli.count, interval)
        }
        (None, None) => bail!("either --candles or --synthetic is required"),
    };

    let mut runner = BacktestRunner::new();
    if let Some(cap) = cli.max_leverage {
        runner = runner.with_leverage_cap(cap);
    }
    let metrics = runner.run(&session, &candles, &metadata, &bounds)?;

    if cli.report {
        metrics.print_report();
    } else {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    }

    Ok(())
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("momentum_engine=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_candles(path: &Path) -> Result<Vec<Candle>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let candles: Vec<Candle> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse candles from {}", path.display()))?;
    tracing::info!("Loaded {} candles from {}", candles.len(), path.display());
    Ok(candles)
}

/// "15m" -> 15, "1h" -> 60, "1d" -> 1440
fn timeframe_minutes(timeframe: &str) -> Option<i64> {
    let unit = timeframe.chars().last()?;
    let value: i64 = timeframe[..timeframe.len() - unit.len_utf8()].parse().ok()?;
    let minutes = match unit {
        'm' => Some(value),
        'h' => value.checked_mul(60),
        'd' => value.checked_mul(24 * 60),
        _ => return None,
    }?;
    (minutes > 0).then_some(minutes)
}
