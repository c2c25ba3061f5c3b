//! Strategy configuration bundle.
//!
//! `StrategyParameters` is built once before a run, checked by
//! [`StrategyParameters::validated`], and then shared read-only by every
//! engine.

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;

use super::error::CondorError;

/// Unit in which the blackout buffer is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUnit {
    /// Plain calendar days.
    CalendarDays,
    /// Monday to Friday business days. No holiday calendar is applied.
    SessionDays,
}

/// How long an opened position lives before it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionHorizon {
    /// Expires on the first given weekday on or after the entry date.
    WeeklyExpiry { weekday: Weekday },
    /// Expires on the n-th bar after the entry bar.
    Bars(usize),
}

/// Trading session in local wall-clock time, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionWindow {
    pub timezone: Tz,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl SessionWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.open <= time && time <= self.close
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParameters {
    pub ema_period: usize,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub adx_period: usize,
    pub rsi_period: usize,

    pub adx_threshold: f64,
    pub rsi_low: f64,
    pub rsi_high: f64,
    pub iv_rank_min: f64,
    pub one_entry_per_week: bool,

    pub credit: f64,
    pub max_loss: f64,

    pub blackout_buffer: u32,
    pub buffer_unit: BufferUnit,

    pub session: SessionWindow,
    pub horizon: PositionHorizon,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        StrategyParameters {
            ema_period: 20,
            atr_period: 14,
            atr_multiplier: 2.0,
            adx_period: 14,
            rsi_period: 14,
            adx_threshold: 25.0,
            rsi_low: 30.0,
            rsi_high: 70.0,
            iv_rank_min: 30.0,
            one_entry_per_week: true,
            credit: 0.50,
            max_loss: 2.50,
            blackout_buffer: 3,
            buffer_unit: BufferUnit::CalendarDays,
            session: SessionWindow {
                timezone: chrono_tz::America::New_York,
                open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
                close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            },
            horizon: PositionHorizon::WeeklyExpiry {
                weekday: Weekday::Fri,
            },
        }
    }
}

impl StrategyParameters {
    /// Checks every range constraint and hands the bundle back unchanged.
    pub fn validated(self) -> Result<Self, CondorError> {
        for (key, period) in [
            ("ema_period", self.ema_period),
            ("atr_period", self.atr_period),
            ("adx_period", self.adx_period),
            ("rsi_period", self.rsi_period),
        ] {
            if period < 1 {
                return Err(CondorError::invalid("indicators", key, "period must be >= 1"));
            }
        }
        if !(self.atr_multiplier > 0.0 && self.atr_multiplier.is_finite()) {
            return Err(CondorError::invalid(
                "indicators",
                "atr_multiplier",
                "atr_multiplier must be positive",
            ));
        }

        for (key, value) in [
            ("adx_threshold", self.adx_threshold),
            ("rsi_low", self.rsi_low),
            ("rsi_high", self.rsi_high),
            ("iv_rank_min", self.iv_rank_min),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(CondorError::invalid("entry", key, "must be in [0, 100]"));
            }
        }
        if self.rsi_low > self.rsi_high {
            return Err(CondorError::invalid(
                "entry",
                "rsi_low",
                "rsi_low must be <= rsi_high",
            ));
        }

        for (key, value) in [("credit", self.credit), ("max_loss", self.max_loss)] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(CondorError::invalid("position", key, "must be non-negative"));
            }
        }
        if let PositionHorizon::Bars(0) = self.horizon {
            return Err(CondorError::invalid(
                "position",
                "horizon_bars",
                "horizon_bars must be >= 1",
            ));
        }

        if self.session.open >= self.session.close {
            return Err(CondorError::invalid(
                "session",
                "open",
                "session open must be before close",
            ));
        }

        Ok(self)
    }
}
