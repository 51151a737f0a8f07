use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Direction, ExitReason};

/// Record of a single trade for analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub pair: String,
    pub direction: Direction,
    pub enter_tag: Option<String>,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub leverage: f64,
    pub stake_amount: f64,
    /// Leveraged profit as a fraction of stake
    pub profit_ratio: f64,
    /// Profit in stake currency
    pub profit_abs: f64,
    pub holding_period_minutes: i64,
    pub exit_reason: ExitReason,
}

/// Complete backtest performance metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestMetrics {
    // Trade Statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,

    // P&L Distribution
    pub total_profit: f64,
    pub avg_profit_ratio: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub profit_factor: f64, // Total wins / Total losses

    // Risk Metrics
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,

    // Holding Period
    pub avg_holding_period_minutes: f64,
    pub max_holding_period_minutes: i64,
    pub min_holding_period_minutes: i64,

    /// Exit reason tag -> number of trades
    pub exit_reasons: BTreeMap<String, usize>,
    /// Rows where long and short entries fired together
    pub entry_conflicts: usize,

    // Trade Records
    pub trades: Vec<TradeRecord>,
}

impl BacktestMetrics {
    /// Calculate metrics from closed trades
    pub fn from_trades(trades: Vec<TradeRecord>, entry_conflicts: usize) -> Self {
        let total_trades = trades.len();

        if total_trades == 0 {
            return Self::empty(entry_conflicts);
        }

        let total_profit: f64 = trades.iter().map(|t| t.profit_abs).sum();
        let avg_profit_ratio =
            trades.iter().map(|t| t.profit_ratio).sum::<f64>() / total_trades as f64;

        // Win/Loss statistics
        let winning_trades: Vec<&TradeRecord> =
            trades.iter().filter(|t| t.profit_abs > 0.0).collect();
        let losing_trades: Vec<&TradeRecord> =
            trades.iter().filter(|t| t.profit_abs <= 0.0).collect();

        let winning_count = winning_trades.len();
        let losing_count = losing_trades.len();
        let win_rate = (winning_count as f64 / total_trades as f64) * 100.0;

        let total_wins: f64 = winning_trades.iter().map(|t| t.profit_abs).sum();
        let total_losses: f64 = losing_trades.iter().map(|t| t.profit_abs.abs()).sum();

        let avg_win = if winning_count > 0 {
            total_wins / winning_count as f64
        } else {
            0.0
        };

        let avg_loss = if losing_count > 0 {
            total_losses / losing_count as f64
        } else {
            0.0
        };

        let largest_win = winning_trades
            .iter()
            .map(|t| t.profit_abs)
            .fold(0.0, f64::max);
        let largest_loss = losing_trades
            .iter()
            .map(|t| t.profit_abs)
            .fold(0.0, f64::min);

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let max_drawdown = Self::calculate_drawdown(&trades);
        let sharpe_ratio = Self::calculate_sharpe_ratio(&trades);

        let holding_periods: Vec<i64> = trades.iter().map(|t| t.holding_period_minutes).collect();
        let avg_holding_period_minutes =
            holding_periods.iter().sum::<i64>() as f64 / holding_periods.len() as f64;
        let max_holding_period_minutes = holding_periods.iter().copied().max().unwrap_or(0);
        let min_holding_period_minutes = holding_periods.iter().copied().min().unwrap_or(0);

        let mut exit_reasons = BTreeMap::new();
        for trade in &trades {
            *exit_reasons
                .entry(trade.exit_reason.tag().to_string())
                .or_insert(0) += 1;
        }

        Self {
            total_trades,
            winning_trades: winning_count,
            losing_trades: losing_count,
            win_rate,
            total_profit,
            avg_profit_ratio,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            profit_factor,
            max_drawdown,
            sharpe_ratio,
            avg_holding_period_minutes,
            max_holding_period_minutes,
            min_holding_period_minutes,
            exit_reasons,
            entry_conflicts,
            trades,
        }
    }

    /// Empty metrics for when no trades occurred
    fn empty(entry_conflicts: usize) -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            total_profit: 0.0,
            avg_profit_ratio: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            largest_win: 0.0,
            largest_loss: 0.0,
            profit_factor: 0.0,
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
            avg_holding_period_minutes: 0.0,
            max_holding_period_minutes: 0,
            min_holding_period_minutes: 0,
            exit_reasons: BTreeMap::new(),
            entry_conflicts,
            trades: vec![],
        }
    }

    /// Largest peak-to-trough fall of cumulative profit, in stake currency
    fn calculate_drawdown(trades: &[TradeRecord]) -> f64 {
        let mut peak = 0.0_f64;
        let mut max_dd = 0.0_f64;
        let mut cumulative = 0.0;

        for trade in trades {
            cumulative += trade.profit_abs;
            peak = peak.max(cumulative);
            max_dd = max_dd.max(peak - cumulative);
        }

        max_dd
    }

    /// Calculate Sharpe ratio (simplified)
    /// Assumes risk-free rate of 0 for simplicity
    fn calculate_sharpe_ratio(trades: &[TradeRecord]) -> f64 {
        if trades.is_empty() {
            return 0.0;
        }

        let returns: Vec<f64> = trades.iter().map(|t| t.profit_ratio).collect();
        let mean_return = returns.iter().sum::<f64>() / returns.len() as f64;

        let variance = returns
            .iter()
            .map(|r| {
                let diff = r - mean_return;
                diff * diff
            })
            .sum::<f64>()
            / returns.len() as f64;

        let std_dev = variance.sqrt();

        if std_dev > 0.0 {
            mean_return / std_dev
        } else {
            0.0
        }
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              BACKTEST PERFORMANCE REPORT              ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("📊 P&L SUMMARY");
        println!("  Total Profit:          {:.2}", self.total_profit);
        println!(
            "  Avg Profit / Trade:    {:+.2}%",
            self.avg_profit_ratio * 100.0
        );

        println!("\n📈 TRADE STATISTICS");
        println!("  Total Trades:          {}", self.total_trades);
        println!(
            "  Winning Trades:        {} ({:.1}%)",
            self.winning_trades, self.win_rate
        );
        println!("  Losing Trades:         {}", self.losing_trades);
        println!("  Entry Conflicts:       {}", self.entry_conflicts);

        if self.total_trades > 0 {
            println!("\n💰 WIN/LOSS ANALYSIS");
            println!("  Average Win:           {:.2}", self.avg_win);
            println!("  Average Loss:          {:.2}", self.avg_loss);
            println!("  Largest Win:           {:.2}", self.largest_win);
            println!("  Largest Loss:          {:.2}", self.largest_loss);
            println!("  Profit Factor:         {:.2}", self.profit_factor);

            println!("\n⚠️  RISK METRICS");
            println!("  Max Drawdown:          {:.2}", self.max_drawdown);
            println!("  Sharpe Ratio:          {:.2}", self.sharpe_ratio);

            println!("\n⏱️  HOLDING PERIODS");
            println!(
                "  Average:               {:.1} minutes ({:.1} hours)",
                self.avg_holding_period_minutes,
                self.avg_holding_period_minutes / 60.0
            );
            println!(
                "  Max:                   {} minutes",
                self.max_holding_period_minutes
            );
            println!(
                "  Min:                   {} minutes",
                self.min_holding_period_minutes
            );

            println!("\n🚪 EXIT REASONS");
            for (reason, count) in &self.exit_reasons {
                println!("  {:<22} {}", format!("{reason}:"), count);
            }
        }

        println!("\n═════════════════════════════════════════════════════════\n");
    }
}
