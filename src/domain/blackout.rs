//! Blackout-date filter.
//!
//! Each event date blocks the inclusive range `[date - buffer, date + buffer]`;
//! overlapping ranges simply merge. Dates are mapped to ordinals in the
//! configured unit, so both units share one binary search over the sorted
//! event ordinals.
//!
//! With `BufferUnit::SessionDays` the ordinal counts Monday to Friday only.
//! A Saturday or Sunday is measured as the following Monday.

use chrono::{Datelike, NaiveDate};

use super::params::BufferUnit;

/// One excluded event, e.g. an FOMC meeting or a CPI print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlackoutWindow {
    pub date: NaiveDate,
    pub reason: String,
}

impl BlackoutWindow {
    pub fn new(date: NaiveDate, reason: impl Into<String>) -> Self {
        BlackoutWindow {
            date,
            reason: reason.into(),
        }
    }
}

/// Two events whose buffered ranges intersect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlackoutOverlap {
    pub first: BlackoutWindow,
    pub second: BlackoutWindow,
}

#[derive(Debug, Clone)]
pub struct BlackoutFilter {
    buffer: i64,
    unit: BufferUnit,
    ordinals: Vec<i64>,
    overlaps: Vec<BlackoutOverlap>,
}

impl BlackoutFilter {
    pub fn new(windows: &[BlackoutWindow], buffer: u32, unit: BufferUnit) -> Self {
        let buffer = i64::from(buffer);

        let mut sorted: Vec<&BlackoutWindow> = windows.iter().collect();
        sorted.sort_by_key(|w| w.date);

        let overlaps = sorted
            .windows(2)
            .filter(|pair| ordinal(pair[1].date, unit) - ordinal(pair[0].date, unit) <= 2 * buffer)
            .map(|pair| BlackoutOverlap {
                first: pair[0].clone(),
                second: pair[1].clone(),
            })
            .collect();

        let mut ordinals: Vec<i64> = sorted.iter().map(|w| ordinal(w.date, unit)).collect();
        ordinals.dedup();

        BlackoutFilter {
            buffer,
            unit,
            ordinals,
            overlaps,
        }
    }

    /// True if `date` lies within `buffer` units of any event (inclusive).
    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        let day = ordinal(date, self.unit);
        let first_candidate = self.ordinals.partition_point(|&o| o < day - self.buffer);
        self.ordinals
            .get(first_candidate)
            .is_some_and(|&o| o <= day + self.buffer)
    }

    /// Adjacent events whose buffered ranges intersect.
    pub fn overlaps(&self) -> &[BlackoutOverlap] {
        &self.overlaps
    }

    pub fn event_count(&self) -> usize {
        self.ordinals.len()
    }
}

fn ordinal(date: NaiveDate, unit: BufferUnit) -> i64 {
    let days = i64::from(date.num_days_from_ce());
    match unit {
        BufferUnit::CalendarDays => days,
        BufferUnit::SessionDays => session_ordinal(days),
    }
}

/// Number of Monday-Friday days strictly before the given day number.
/// Day 1 (0001-01-01) is a Monday.
fn session_ordinal(days_from_ce: i64) -> i64 {
    let zero_based = days_from_ce - 1;
    let weeks = zero_based.div_euclid(7);
    let weekday = zero_based.rem_euclid(7);
    weeks * 5 + weekday.min(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn filter(dates: &[NaiveDate], buffer: u32, unit: BufferUnit) -> BlackoutFilter {
        let windows: Vec<_> = dates
            .iter()
            .map(|&date| BlackoutWindow::new(date, "event"))
            .collect();
        BlackoutFilter::new(&windows, buffer, unit)
    }

    #[test]
    fn calendar_buffer_is_inclusive() {
        let event = d(2024, 3, 15);
        let f = filter(&[event], 2, BufferUnit::CalendarDays);
        assert!(f.is_blocked(d(2024, 3, 13)));
        assert!(f.is_blocked(d(2024, 3, 15)));
        assert!(f.is_blocked(d(2024, 3, 17)));
        assert!(!f.is_blocked(d(2024, 3, 12)));
        assert!(!f.is_blocked(d(2024, 3, 18)));
    }

    #[test]
    fn zero_buffer_blocks_only_event_day() {
        let f = filter(&[d(2024, 3, 15)], 0, BufferUnit::CalendarDays);
        assert!(f.is_blocked(d(2024, 3, 15)));
        assert!(!f.is_blocked(d(2024, 3, 14)));
        assert!(!f.is_blocked(d(2024, 3, 16)));
    }

    #[test]
    fn empty_filter_blocks_nothing() {
        let f = filter(&[], 5, BufferUnit::CalendarDays);
        assert!(!f.is_blocked(d(2024, 3, 15)));
        assert_eq!(f.event_count(), 0);
    }

    #[test]
    fn overlapping_windows_merge() {
        let f = filter(
            &[d(2024, 3, 10), d(2024, 3, 14)],
            3,
            BufferUnit::CalendarDays,
        );
        for day in 7..=17 {
            assert!(f.is_blocked(d(2024, 3, day)), "day {day}");
        }
        assert!(!f.is_blocked(d(2024, 3, 6)));
        assert!(!f.is_blocked(d(2024, 3, 18)));
        assert_eq!(f.overlaps().len(), 1);
    }

    #[test]
    fn unsorted_and_duplicate_events() {
        let f = filter(
            &[d(2024, 6, 1), d(2024, 1, 1), d(2024, 6, 1)],
            1,
            BufferUnit::CalendarDays,
        );
        assert_eq!(f.event_count(), 2);
        assert!(f.is_blocked(d(2023, 12, 31)));
        assert!(f.is_blocked(d(2024, 6, 2)));
        assert!(!f.is_blocked(d(2024, 3, 1)));
    }

    #[test]
    fn gap_between_events_is_open() {
        let f = filter(
            &[d(2024, 3, 1), d(2024, 3, 20)],
            2,
            BufferUnit::CalendarDays,
        );
        assert!(f.overlaps().is_empty());
        assert!(!f.is_blocked(d(2024, 3, 10)));
        assert!(f.is_blocked(d(2024, 3, 3)));
        assert!(f.is_blocked(d(2024, 3, 18)));
    }

    #[test]
    fn session_ordinal_skips_weekends() {
        // 2024-03-15 is a Friday, 2024-03-18 the following Monday
        let fri = ordinal(d(2024, 3, 15), BufferUnit::SessionDays);
        let sat = ordinal(d(2024, 3, 16), BufferUnit::SessionDays);
        let sun = ordinal(d(2024, 3, 17), BufferUnit::SessionDays);
        let mon = ordinal(d(2024, 3, 18), BufferUnit::SessionDays);
        assert_eq!(mon - fri, 1);
        assert_eq!(sat, mon);
        assert_eq!(sun, mon);
    }

    #[test]
    fn session_buffer_spans_weekend() {
        // Friday event, buffer 2 sessions: Wed..Tue
        let f = filter(&[d(2024, 3, 15)], 2, BufferUnit::SessionDays);
        assert!(f.is_blocked(d(2024, 3, 13)));
        assert!(f.is_blocked(d(2024, 3, 19)));
        assert!(!f.is_blocked(d(2024, 3, 12)));
        assert!(!f.is_blocked(d(2024, 3, 20)));
    }

    #[test]
    fn calendar_and_session_units_differ() {
        let event = d(2024, 3, 15);
        let cal = filter(&[event], 2, BufferUnit::CalendarDays);
        let ses = filter(&[event], 2, BufferUnit::SessionDays);
        assert!(!cal.is_blocked(d(2024, 3, 19)));
        assert!(ses.is_blocked(d(2024, 3, 19)));
    }
}
