//! Performance summary over finalized trades.
//!
//! The equity curve is the running sum of realized pnl, starting from an
//! implicit 0 before the first trade. Drawdown is measured from the running
//! peak of that curve, so the starting 0 counts as a peak.
//!
//! Profit factor is `f64::INFINITY` when there are wins and no losses, and
//! `0.0` when there are no wins.

use chrono::DateTime;
use chrono_tz::Tz;

use super::trade::{ExitReason, Trade};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub timestamp: DateTime<Tz>,
    pub cumulative_pnl: f64,
    pub peak: f64,
    pub drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalyticsSummary {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    pub breaches: usize,
    pub expiries: usize,
    pub total_pnl: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    /// Magnitude, not signed.
    pub avg_loss: f64,
    pub largest_win: f64,
    /// Magnitude, not signed.
    pub largest_loss: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub max_drawdown: f64,
    pub equity_curve: Vec<EquityPoint>,
}

/// Summarizes trades ordered by exit time. An empty slice yields the
/// all-zero default.
pub fn summarize(trades: &[Trade]) -> AnalyticsSummary {
    if trades.is_empty() {
        return AnalyticsSummary::default();
    }

    let mut wins = 0usize;
    let mut losses = 0usize;
    let mut breakevens = 0usize;
    let mut breaches = 0usize;
    let mut total_wins = 0.0_f64;
    let mut total_losses = 0.0_f64;
    let mut largest_win = 0.0_f64;
    let mut largest_loss = 0.0_f64;

    for trade in trades {
        let pnl = trade.pnl();
        if pnl > 0.0 {
            wins += 1;
            total_wins += pnl;
            largest_win = largest_win.max(pnl);
        } else if pnl < 0.0 {
            losses += 1;
            total_losses += pnl.abs();
            largest_loss = largest_loss.max(pnl.abs());
        } else {
            breakevens += 1;
        }
        if trade.exit_reason() == ExitReason::Breach {
            breaches += 1;
        }
    }

    let total_trades = trades.len();
    let equity_curve = equity_curve(trades);
    let max_drawdown = equity_curve
        .iter()
        .map(|p| p.drawdown)
        .fold(0.0_f64, f64::max);
    let total_pnl = equity_curve.last().map_or(0.0, |p| p.cumulative_pnl);

    let profit_factor = if total_losses > 0.0 {
        total_wins / total_losses
    } else if total_wins > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    let avg_win = if wins > 0 {
        total_wins / wins as f64
    } else {
        0.0
    };

    let avg_loss = if losses > 0 {
        total_losses / losses as f64
    } else {
        0.0
    };

    AnalyticsSummary {
        total_trades,
        wins,
        losses,
        breakevens,
        breaches,
        expiries: total_trades - breaches,
        total_pnl,
        win_rate: wins as f64 / total_trades as f64,
        avg_win,
        avg_loss,
        largest_win,
        largest_loss,
        profit_factor,
        expectancy: total_pnl / total_trades as f64,
        max_drawdown,
        equity_curve,
    }
}

/// One point per trade, stamped at its exit time.
pub fn equity_curve(trades: &[Trade]) -> Vec<EquityPoint> {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    trades
        .iter()
        .map(|trade| {
            cumulative += trade.pnl();
            peak = peak.max(cumulative);
            EquityPoint {
                timestamp: trade.exit_time(),
                cumulative_pnl: cumulative,
                peak,
                drawdown: peak - cumulative,
            }
        })
        .collect()
}
