//! Single-pass simulation driver.
//!
//! Per bar: update indicators, then either run the exit rules (position
//! open) or the entry predicates (flat). The bar that closes a position is
//! not considered for a new entry. A position still open after the last bar
//! is force-closed against that bar's close.

use tracing::{debug, info, warn};

use super::analytics::{self, AnalyticsSummary};
use super::bar::PriceBar;
use super::blackout::{BlackoutFilter, BlackoutWindow};
use super::entry::{EntryDecision, EntryEngine, predicate_order};
use super::error::CondorError;
use super::exit::{ExitDecision, ExitEngine};
use super::indicator::IndicatorEngine;
use super::params::StrategyParameters;
use super::trade::{OpenPosition, RejectedTrade, RejectionReason, Trade};

/// Everything one run produces. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    trades: Vec<Trade>,
    rejections: Vec<RejectedTrade>,
    summary: AnalyticsSummary,
    bars_processed: usize,
}

impl SimulationOutput {
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn rejections(&self) -> &[RejectedTrade] {
        &self.rejections
    }

    pub fn summary(&self) -> &AnalyticsSummary {
        &self.summary
    }

    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    /// Rejection totals per reason, in predicate order. Reasons that never
    /// fired are included with a count of 0.
    pub fn rejection_counts(&self) -> Vec<(RejectionReason, usize)> {
        predicate_order()
            .into_iter()
            .map(|reason| {
                let count = self
                    .rejections
                    .iter()
                    .filter(|r| r.reason() == reason)
                    .count();
                (reason, count)
            })
            .collect()
    }
}

pub fn run(
    bars: &[PriceBar],
    blackouts: &[BlackoutWindow],
    params: &StrategyParameters,
) -> Result<SimulationOutput, CondorError> {
    let filter = BlackoutFilter::new(blackouts, params.blackout_buffer, params.buffer_unit);
    for overlap in filter.overlaps() {
        warn!(
            first = %overlap.first.date,
            first_reason = %overlap.first.reason,
            second = %overlap.second.date,
            second_reason = %overlap.second.reason,
            "blackout windows overlap"
        );
    }

    let mut indicators = IndicatorEngine::new(params);
    let mut entry = EntryEngine::new(params, &filter);
    let exit = ExitEngine::new(params);

    info!(
        bars = bars.len(),
        blackout_events = filter.event_count(),
        warmup_bars = indicators.warmup_bars(),
        "starting simulation"
    );

    let mut trades: Vec<Trade> = Vec::new();
    let mut rejections: Vec<RejectedTrade> = Vec::new();
    let mut open: Option<OpenPosition> = None;
    let mut prev: Option<&PriceBar> = None;

    for (index, bar) in bars.iter().enumerate() {
        bar.check(index)?;
        if let Some(prev) = prev {
            if bar.timestamp <= prev.timestamp {
                return Err(CondorError::InvariantViolation {
                    index,
                    reason: format!(
                        "timestamp {} not after previous {}",
                        bar.timestamp, prev.timestamp
                    ),
                });
            }
        }
        prev = Some(bar);

        let snapshot = indicators.update(bar);

        if let Some(mut position) = open.take() {
            match exit.evaluate(bar, &mut position) {
                ExitDecision::Closed(closing) => {
                    let trade = position.close(closing);
                    debug!(
                        id = trade.id(),
                        exit = %trade.exit_time(),
                        reason = %trade.exit_reason(),
                        pnl = trade.pnl(),
                        "position closed"
                    );
                    trades.push(trade);
                }
                ExitDecision::StillOpen => open = Some(position),
            }
            continue;
        }

        match entry.evaluate(bar, &snapshot, open.is_some())? {
            EntryDecision::Accepted {
                upper_strike,
                lower_strike,
                credit,
            } => {
                let position = entry.open(bar, &snapshot, upper_strike, lower_strike, credit);
                debug!(
                    id = position.id,
                    entry = %position.entry_time,
                    upper = position.upper_strike,
                    lower = position.lower_strike,
                    credit = position.credit,
                    "position opened"
                );
                open = Some(position);
            }
            EntryDecision::Rejected { reason, detail } => {
                rejections.push(EntryEngine::reject(bar, &snapshot, reason, detail));
            }
        }
    }

    if let (Some(position), Some(last)) = (open.take(), bars.last()) {
        let closing = exit.force_close(last, &position);
        let trade = position.close(closing);
        debug!(
            id = trade.id(),
            reason = %trade.exit_reason(),
            pnl = trade.pnl(),
            "position force-closed at end of data"
        );
        trades.push(trade);
    }

    let summary = analytics::summarize(&trades);
    info!(
        trades = summary.total_trades,
        rejections = rejections.len(),
        total_pnl = summary.total_pnl,
        max_drawdown = summary.max_drawdown,
        "simulation complete"
    );

    Ok(SimulationOutput {
        trades,
        rejections,
        summary,
        bars_processed: bars.len(),
    })
}
