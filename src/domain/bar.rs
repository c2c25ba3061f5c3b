//! Price bar representation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;

use super::error::CondorError;

/// One bar of underlying price data with its implied-volatility rank.
///
/// Timestamps are zone-aware. Every calendar question (session membership,
/// blackout date, ISO week, expiry) is answered in the session zone, whatever
/// zone the timestamp happens to carry.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<Tz>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub iv_rank: f64,
}

impl PriceBar {
    /// Wall-clock date and time in `zone`.
    pub fn local(&self, zone: Tz) -> NaiveDateTime {
        self.timestamp.with_timezone(&zone).naive_local()
    }

    /// Calendar date in `zone`.
    pub fn date_in(&self, zone: Tz) -> NaiveDate {
        self.local(zone).date()
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Checks the per-bar input contract. `index` is used for error reporting.
    pub fn check(&self, index: usize) -> Result<(), CondorError> {
        let violation = |reason: String| CondorError::InvariantViolation { index, reason };

        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(violation("non-finite price".into()));
        }
        if self.high < self.low {
            return Err(violation(format!("high {} < low {}", self.high, self.low)));
        }
        if self.high < self.open.max(self.close) || self.low > self.open.min(self.close) {
            return Err(violation(format!(
                "open/close outside [{}, {}]",
                self.low, self.high
            )));
        }
        if !(0.0..=100.0).contains(&self.iv_rank) {
            return Err(violation(format!("iv_rank {} outside [0, 100]", self.iv_rank)));
        }
        Ok(())
    }
}
