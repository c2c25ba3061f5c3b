//! Trade records: the open position, finalized trades and rejections.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use std::fmt;

use super::indicator::IndicatorSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Breach,
    Expiry,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Breach => "breach",
            ExitReason::Expiry => "expiry",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which short strike was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachSide {
    Upper,
    Lower,
}

impl BreachSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreachSide::Upper => "upper",
            BreachSide::Lower => "lower",
        }
    }
}

/// Why a flat bar did not open a position. Variants are listed in
/// evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    IndicatorsNotReady,
    OutsideSession,
    WithinBlackout,
    TrendTooStrong,
    MomentumOutOfRange,
    IvRankTooLow,
    ChannelTooNarrow,
    DuplicateWeek,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::IndicatorsNotReady => "indicators_not_ready",
            RejectionReason::OutsideSession => "outside_session",
            RejectionReason::WithinBlackout => "within_blackout",
            RejectionReason::TrendTooStrong => "trend_too_strong",
            RejectionReason::MomentumOutOfRange => "momentum_out_of_range",
            RejectionReason::IvRankTooLow => "iv_rank_too_low",
            RejectionReason::ChannelTooNarrow => "channel_too_narrow",
            RejectionReason::DuplicateWeek => "duplicate_week",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position that has been entered but not yet resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub id: u64,
    pub entry_time: DateTime<Tz>,
    /// Calendar expiry for weekly horizons; `None` for bar-count horizons.
    pub expiry_date: Option<NaiveDate>,
    pub upper_strike: i64,
    pub lower_strike: i64,
    pub credit: f64,
    pub entry_snapshot: IndicatorSnapshot,
    pub entry_iv_rank: f64,
    /// Bars evaluated by the exit engine since entry.
    pub bars_held: usize,
}

/// How an open position is being resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Closing {
    pub exit_time: DateTime<Tz>,
    pub reason: ExitReason,
    pub breach_side: Option<BreachSide>,
    pub pnl: f64,
    pub forced: bool,
}

impl OpenPosition {
    /// Consumes the pending position and produces the finalized record.
    pub fn close(self, closing: Closing) -> Trade {
        Trade {
            id: self.id,
            entry_time: self.entry_time,
            exit_time: closing.exit_time,
            expiry_date: self.expiry_date,
            upper_strike: self.upper_strike,
            lower_strike: self.lower_strike,
            credit: self.credit,
            pnl: closing.pnl,
            exit_reason: closing.reason,
            breach_side: closing.breach_side,
            forced_close: closing.forced,
            entry_adx: self.entry_snapshot.adx,
            entry_rsi: self.entry_snapshot.rsi,
            entry_ema: self.entry_snapshot.ema,
            entry_iv_rank: self.entry_iv_rank,
        }
    }
}

/// A finalized short iron condor. Built only through [`OpenPosition::close`]
/// and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    id: u64,
    entry_time: DateTime<Tz>,
    exit_time: DateTime<Tz>,
    expiry_date: Option<NaiveDate>,
    upper_strike: i64,
    lower_strike: i64,
    credit: f64,
    pnl: f64,
    exit_reason: ExitReason,
    breach_side: Option<BreachSide>,
    forced_close: bool,
    entry_adx: f64,
    entry_rsi: f64,
    entry_ema: f64,
    entry_iv_rank: f64,
}

impl Trade {
    pub fn id(&self) -> u64 {
        self.id
    }
    pub fn entry_time(&self) -> DateTime<Tz> {
        self.entry_time
    }
    pub fn exit_time(&self) -> DateTime<Tz> {
        self.exit_time
    }
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }
    pub fn upper_strike(&self) -> i64 {
        self.upper_strike
    }
    pub fn lower_strike(&self) -> i64 {
        self.lower_strike
    }
    pub fn credit(&self) -> f64 {
        self.credit
    }
    pub fn pnl(&self) -> f64 {
        self.pnl
    }
    pub fn exit_reason(&self) -> ExitReason {
        self.exit_reason
    }
    pub fn breach_side(&self) -> Option<BreachSide> {
        self.breach_side
    }
    /// Closed by the end-of-data rule rather than by a bar.
    pub fn forced_close(&self) -> bool {
        self.forced_close
    }
    pub fn entry_adx(&self) -> f64 {
        self.entry_adx
    }
    pub fn entry_rsi(&self) -> f64 {
        self.entry_rsi
    }
    pub fn entry_ema(&self) -> f64 {
        self.entry_ema
    }
    pub fn entry_iv_rank(&self) -> f64 {
        self.entry_iv_rank
    }
}

/// A flat bar that failed an entry predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedTrade {
    timestamp: DateTime<Tz>,
    reason: RejectionReason,
    detail: String,
    close: f64,
    iv_rank: f64,
    snapshot: IndicatorSnapshot,
}

impl RejectedTrade {
    pub fn new(
        timestamp: DateTime<Tz>,
        reason: RejectionReason,
        detail: String,
        close: f64,
        iv_rank: f64,
        snapshot: IndicatorSnapshot,
    ) -> Self {
        RejectedTrade {
            timestamp,
            reason,
            detail,
            close,
            iv_rank,
            snapshot,
        }
    }

    pub fn timestamp(&self) -> DateTime<Tz> {
        self.timestamp
    }
    pub fn reason(&self) -> RejectionReason {
        self.reason
    }
    pub fn detail(&self) -> &str {
        &self.detail
    }
    pub fn close(&self) -> f64 {
        self.close
    }
    pub fn iv_rank(&self) -> f64 {
        self.iv_rank
    }
    pub fn snapshot(&self) -> &IndicatorSnapshot {
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn sample_open() -> OpenPosition {
        OpenPosition {
            id: 1,
            entry_time: New_York.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2024, 1, 19),
            upper_strike: 110,
            lower_strike: 90,
            credit: 0.5,
            entry_snapshot: IndicatorSnapshot {
                ready: true,
                ema: 100.0,
                atr: 5.0,
                adx: 18.0,
                rsi: 52.0,
                channel_upper: 110,
                channel_lower: 90,
            },
            entry_iv_rank: 45.0,
            bars_held: 3,
        }
    }

    #[test]
    fn close_carries_entry_fields() {
        let exit_time = New_York.with_ymd_and_hms(2024, 1, 17, 11, 0, 0).unwrap();
        let trade = sample_open().close(Closing {
            exit_time,
            reason: ExitReason::Breach,
            breach_side: Some(BreachSide::Upper),
            pnl: -2.5,
            forced: false,
        });

        assert_eq!(trade.id(), 1);
        assert_eq!(trade.upper_strike(), 110);
        assert_eq!(trade.lower_strike(), 90);
        assert_eq!(trade.exit_time(), exit_time);
        assert_eq!(trade.exit_reason(), ExitReason::Breach);
        assert_eq!(trade.breach_side(), Some(BreachSide::Upper));
        assert!((trade.pnl() + 2.5).abs() < f64::EPSILON);
        assert!((trade.entry_adx() - 18.0).abs() < f64::EPSILON);
        assert!((trade.entry_rsi() - 52.0).abs() < f64::EPSILON);
        assert!((trade.entry_iv_rank() - 45.0).abs() < f64::EPSILON);
        assert!(!trade.forced_close());
    }

    #[test]
    fn reason_names_are_stable() {
        assert_eq!(ExitReason::Breach.to_string(), "breach");
        assert_eq!(ExitReason::Expiry.to_string(), "expiry");
        assert_eq!(
            RejectionReason::WithinBlackout.to_string(),
            "within_blackout"
        );
        assert_eq!(
            RejectionReason::MomentumOutOfRange.as_str(),
            "momentum_out_of_range"
        );
    }
}
