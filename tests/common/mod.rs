#![allow(dead_code)]

use chrono::{Duration, NaiveDate, TimeZone};
use chrono_tz::America::New_York;
use condor::domain::bar::PriceBar;
use condor::domain::blackout::BlackoutWindow;
use condor::domain::error::CondorError;
use condor::domain::indicator::IndicatorSnapshot;
use condor::domain::params::{SessionWindow, StrategyParameters};
use condor::domain::trade::{BreachSide, Closing, ExitReason, OpenPosition, Trade};
use condor::ports::data_port::DataPort;
use std::io::Write;

pub struct MockDataPort {
    pub bars: Vec<PriceBar>,
    pub blackouts: Vec<BlackoutWindow>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self {
            bars,
            blackouts: Vec::new(),
            error: None,
        }
    }

    pub fn with_blackout(mut self, date: NaiveDate, reason: &str) -> Self {
        self.blackouts.push(BlackoutWindow::new(date, reason));
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_bars(&self, session: &SessionWindow) -> Result<Vec<PriceBar>, CondorError> {
        if let Some(reason) = &self.error {
            return Err(CondorError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .bars
            .iter()
            .cloned()
            .map(|mut b| {
                b.timestamp = b.timestamp.with_timezone(&session.timezone);
                b
            })
            .collect())
    }

    fn load_blackouts(&self) -> Result<Vec<BlackoutWindow>, CondorError> {
        Ok(self.blackouts.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Bar `day` days after Monday 2024-01-01, at 11:00 New York time.
pub fn make_bar(day: i64, open: f64, high: f64, low: f64, close: f64, iv_rank: f64) -> PriceBar {
    let start = New_York.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap();
    PriceBar {
        timestamp: start + Duration::days(day),
        open,
        high,
        low,
        close,
        volume: 1_000,
        iv_rank,
    }
}

/// Closes alternating 100/101 with high/low one point away: RSI near 50,
/// ADX low, every entry filter passes once warmed up.
pub fn quiet_bars(n: usize) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let c = if i % 2 == 0 { 100.0 } else { 101.0 };
            make_bar(i as i64, c, c + 1.0, c - 1.0, c, 50.0)
        })
        .collect()
}

/// Fast-warming parameters with the trend and momentum filters opened up.
pub fn fast_params() -> StrategyParameters {
    StrategyParameters {
        ema_period: 3,
        atr_period: 3,
        adx_period: 2,
        rsi_period: 2,
        adx_threshold: 100.0,
        rsi_low: 0.0,
        rsi_high: 100.0,
        iv_rank_min: 0.0,
        ..Default::default()
    }
}

pub fn good_snapshot() -> IndicatorSnapshot {
    IndicatorSnapshot {
        ready: true,
        ema: 100.0,
        atr: 2.0,
        adx: 15.0,
        rsi: 50.0,
        channel_upper: 104,
        channel_lower: 96,
    }
}

/// A finalized trade with the given pnl, one week apart per id.
pub fn closed_trade(id: u64, pnl: f64) -> Trade {
    let entry = New_York.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap() + Duration::weeks(id as i64);
    let position = OpenPosition {
        id,
        entry_time: entry,
        expiry_date: None,
        upper_strike: 104,
        lower_strike: 96,
        credit: 0.5,
        entry_snapshot: good_snapshot(),
        entry_iv_rank: 50.0,
        bars_held: 0,
    };
    let (reason, breach_side) = if pnl < 0.0 {
        (ExitReason::Breach, Some(BreachSide::Lower))
    } else {
        (ExitReason::Expiry, None)
    };
    position.close(Closing {
        exit_time: entry + Duration::days(4),
        reason,
        breach_side,
        pnl,
        forced: false,
    })
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Renders bars as a price CSV in naive local time.
pub fn price_csv(bars: &[PriceBar]) -> String {
    let mut out = String::from("Timestamp,Open,High,Low,Close,Volume,IV_Rank\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume,
            b.iv_rank
        ));
    }
    out
}
