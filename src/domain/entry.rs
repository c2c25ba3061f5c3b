//! Entry signal evaluation.
//!
//! A flat bar is checked against a fixed, ordered list of named predicates.
//! Evaluation stops at the first failure and that predicate's reason is
//! logged. The order is:
//!
//! 1. `indicators_not_ready`  - snapshot still warming up
//! 2. `outside_session`       - bar time outside the session window
//! 3. `within_blackout`       - bar date inside a blackout buffer
//! 4. `trend_too_strong`      - ADX above threshold
//! 5. `momentum_out_of_range` - RSI outside [rsi_low, rsi_high]
//! 6. `iv_rank_too_low`       - IV rank below minimum
//! 7. `channel_too_narrow`    - rounded strikes not strictly ordered
//! 8. `duplicate_week`        - already entered this ISO week (optional)

use chrono::{Datelike, IsoWeek, NaiveDate, Weekday};

use super::bar::PriceBar;
use super::blackout::BlackoutFilter;
use super::error::CondorError;
use super::indicator::IndicatorSnapshot;
use super::params::{PositionHorizon, StrategyParameters};
use super::trade::{OpenPosition, RejectedTrade, RejectionReason};

#[derive(Debug, Clone, PartialEq)]
pub enum EntryDecision {
    Accepted {
        upper_strike: i64,
        lower_strike: i64,
        credit: f64,
    },
    Rejected {
        reason: RejectionReason,
        detail: String,
    },
}

struct EntryContext<'a> {
    bar: &'a PriceBar,
    snapshot: &'a IndicatorSnapshot,
    params: &'a StrategyParameters,
    blackout: &'a BlackoutFilter,
    last_entry_week: Option<IsoWeek>,
}

/// Returns `Some(detail)` when the predicate fails.
type Predicate = fn(&EntryContext<'_>) -> Option<String>;

const PREDICATES: [(RejectionReason, Predicate); 8] = [
    (RejectionReason::IndicatorsNotReady, indicators_ready),
    (RejectionReason::OutsideSession, in_session),
    (RejectionReason::WithinBlackout, outside_blackout),
    (RejectionReason::TrendTooStrong, trend_weak_enough),
    (RejectionReason::MomentumOutOfRange, momentum_in_range),
    (RejectionReason::IvRankTooLow, iv_rank_high_enough),
    (RejectionReason::ChannelTooNarrow, channel_wide_enough),
    (RejectionReason::DuplicateWeek, new_week),
];

/// Names of the entry predicates in evaluation order.
pub fn predicate_order() -> [RejectionReason; 8] {
    PREDICATES.map(|(reason, _)| reason)
}

fn indicators_ready(ctx: &EntryContext<'_>) -> Option<String> {
    (!ctx.snapshot.ready).then(|| "indicator warm-up not complete".to_string())
}

fn in_session(ctx: &EntryContext<'_>) -> Option<String> {
    let time = ctx.bar.local(ctx.params.session.timezone).time();
    (!ctx.params.session.contains(time)).then(|| {
        format!(
            "bar time {} outside session {}-{}",
            time, ctx.params.session.open, ctx.params.session.close
        )
    })
}

fn outside_blackout(ctx: &EntryContext<'_>) -> Option<String> {
    let date = ctx.bar.date_in(ctx.params.session.timezone);
    ctx.blackout
        .is_blocked(date)
        .then(|| format!("date {date} within blackout buffer"))
}

fn trend_weak_enough(ctx: &EntryContext<'_>) -> Option<String> {
    let adx = ctx.snapshot.adx;
    (adx > ctx.params.adx_threshold)
        .then(|| format!("ADX={adx:.2} > threshold={}", ctx.params.adx_threshold))
}

fn momentum_in_range(ctx: &EntryContext<'_>) -> Option<String> {
    let rsi = ctx.snapshot.rsi;
    let (low, high) = (ctx.params.rsi_low, ctx.params.rsi_high);
    (!(low..=high).contains(&rsi)).then(|| format!("RSI={rsi:.2} outside [{low}, {high}]"))
}

fn iv_rank_high_enough(ctx: &EntryContext<'_>) -> Option<String> {
    let iv_rank = ctx.bar.iv_rank;
    (iv_rank < ctx.params.iv_rank_min)
        .then(|| format!("IV_Rank={iv_rank:.2} < min={}", ctx.params.iv_rank_min))
}

fn channel_wide_enough(ctx: &EntryContext<'_>) -> Option<String> {
    let (upper, lower) = (ctx.snapshot.channel_upper, ctx.snapshot.channel_lower);
    (upper <= lower).then(|| format!("upper strike {upper} <= lower strike {lower}"))
}

fn new_week(ctx: &EntryContext<'_>) -> Option<String> {
    if !ctx.params.one_entry_per_week {
        return None;
    }
    let week = ctx.bar.date_in(ctx.params.session.timezone).iso_week();
    (ctx.last_entry_week == Some(week)).then(|| {
        format!(
            "already entered in ISO week {}-W{:02}",
            week.year(),
            week.week()
        )
    })
}

/// Decides entries for flat bars and opens positions that pass.
#[derive(Debug)]
pub struct EntryEngine<'a> {
    params: &'a StrategyParameters,
    blackout: &'a BlackoutFilter,
    next_id: u64,
    last_entry_week: Option<IsoWeek>,
}

impl<'a> EntryEngine<'a> {
    pub fn new(params: &'a StrategyParameters, blackout: &'a BlackoutFilter) -> Self {
        EntryEngine {
            params,
            blackout,
            next_id: 1,
            last_entry_week: None,
        }
    }

    /// Runs the predicate list for one bar. Calling this while a position
    /// is open is a state-machine error.
    pub fn evaluate(
        &self,
        bar: &PriceBar,
        snapshot: &IndicatorSnapshot,
        has_open_position: bool,
    ) -> Result<EntryDecision, CondorError> {
        if has_open_position {
            return Err(CondorError::PositionConflict {
                reason: format!(
                    "entry evaluated at {} while a position is open",
                    bar.timestamp
                ),
            });
        }

        let ctx = EntryContext {
            bar,
            snapshot,
            params: self.params,
            blackout: self.blackout,
            last_entry_week: self.last_entry_week,
        };

        for (reason, predicate) in PREDICATES {
            if let Some(detail) = predicate(&ctx) {
                return Ok(EntryDecision::Rejected { reason, detail });
            }
        }

        Ok(EntryDecision::Accepted {
            upper_strike: snapshot.channel_upper,
            lower_strike: snapshot.channel_lower,
            credit: self.params.credit,
        })
    }

    /// Opens a position for an accepted bar.
    pub fn open(
        &mut self,
        bar: &PriceBar,
        snapshot: &IndicatorSnapshot,
        upper_strike: i64,
        lower_strike: i64,
        credit: f64,
    ) -> OpenPosition {
        let id = self.next_id;
        self.next_id += 1;
        let date = bar.date_in(self.params.session.timezone);
        self.last_entry_week = Some(date.iso_week());

        let expiry_date = match self.params.horizon {
            PositionHorizon::WeeklyExpiry { weekday } => Some(next_weekday(date, weekday)),
            PositionHorizon::Bars(_) => None,
        };

        OpenPosition {
            id,
            entry_time: bar.timestamp,
            expiry_date,
            upper_strike,
            lower_strike,
            credit,
            entry_snapshot: *snapshot,
            entry_iv_rank: bar.iv_rank,
            bars_held: 0,
        }
    }

    /// Builds the rejection record for a bar.
    pub fn reject(
        bar: &PriceBar,
        snapshot: &IndicatorSnapshot,
        reason: RejectionReason,
        detail: String,
    ) -> RejectedTrade {
        RejectedTrade::new(
            bar.timestamp,
            reason,
            detail,
            bar.close,
            bar.iv_rank,
            *snapshot,
        )
    }
}

/// First `weekday` on or after `date`.
pub fn next_weekday(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let target = i64::from(weekday.num_days_from_monday());
    let current = i64::from(date.weekday().num_days_from_monday());
    let ahead = (target - current).rem_euclid(7);
    date + chrono::Duration::days(ahead)
}
