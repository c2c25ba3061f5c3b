//! CSV file data adapter.
//!
//! Price files need the columns `Timestamp,Open,High,Low,Close,Volume,IV_Rank`
//! in any order. Blackout files need `Date` and may carry `Reason`.
//!
//! Accepted timestamp forms:
//! - RFC 3339 with an offset, converted into the session zone
//! - `YYYY-MM-DD HH:MM[:SS]` or `YYYY-MM-DDTHH:MM[:SS]`, read as session
//!   local time (earliest instant when ambiguous, shifted forward one hour
//!   when it falls in a DST gap)
//! - `YYYY-MM-DD`, stamped at the session close

use crate::domain::bar::PriceBar;
use crate::domain::blackout::BlackoutWindow;
use crate::domain::error::CondorError;
use crate::domain::params::SessionWindow;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use std::fs;
use std::path::{Path, PathBuf};

const PRICE_COLUMNS: [&str; 7] = [
    "Timestamp",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "IV_Rank",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const DEFAULT_REASON: &str = "Unspecified";

pub struct CsvAdapter {
    prices: PathBuf,
    blackouts: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(prices: PathBuf, blackouts: Option<PathBuf>) -> Self {
        Self { prices, blackouts }
    }
}

impl DataPort for CsvAdapter {
    fn load_bars(&self, session: &SessionWindow) -> Result<Vec<PriceBar>, CondorError> {
        let content = read_file(&self.prices)?;
        parse_price_csv(&content, session)
    }

    fn load_blackouts(&self) -> Result<Vec<BlackoutWindow>, CondorError> {
        match &self.blackouts {
            Some(path) => parse_blackout_csv(&read_file(path)?),
            None => Ok(Vec::new()),
        }
    }
}

fn read_file(path: &Path) -> Result<String, CondorError> {
    fs::read_to_string(path).map_err(|e| CondorError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn data_err(reason: impl Into<String>) -> CondorError {
    CondorError::Data {
        reason: reason.into(),
    }
}

fn reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Parses, sorts and validates a price file.
pub fn parse_price_csv(
    content: &str,
    session: &SessionWindow,
) -> Result<Vec<PriceBar>, CondorError> {
    let mut rdr = reader(content);
    let headers = rdr
        .headers()
        .map_err(|e| data_err(format!("CSV header error: {}", e)))?
        .clone();

    let mut columns = [0usize; 7];
    let mut missing = Vec::new();
    for (slot, name) in columns.iter_mut().zip(PRICE_COLUMNS) {
        match column_index(&headers, name) {
            Some(i) => *slot = i,
            None => missing.push(name),
        }
    }
    if !missing.is_empty() {
        return Err(data_err(format!(
            "price CSV is missing required columns: {}",
            missing.join(", ")
        )));
    }
    let [ts_col, open_col, high_col, low_col, close_col, volume_col, iv_col] = columns;

    let mut bars = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        // header is line 1
        let line = i + 2;
        let record = result.map_err(|e| data_err(format!("CSV parse error: {}", e)))?;

        let field = |col: usize, name: &str| {
            record
                .get(col)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| data_err(format!("line {line}: missing {name} value")))
        };
        let number = |col: usize, name: &str| -> Result<f64, CondorError> {
            let raw = field(col, name)?;
            raw.parse::<f64>()
                .map_err(|e| data_err(format!("line {line}: invalid {name} value '{raw}': {e}")))
        };

        let timestamp = parse_timestamp(field(ts_col, "Timestamp")?, session)
            .map_err(|reason| data_err(format!("line {line}: {reason}")))?;

        let volume = number(volume_col, "Volume")?;
        if !(volume >= 0.0 && volume.is_finite() && volume.fract() == 0.0) {
            return Err(data_err(format!(
                "line {line}: Volume must be a non-negative integer, got {volume}"
            )));
        }

        let bar = PriceBar {
            timestamp,
            open: number(open_col, "Open")?,
            high: number(high_col, "High")?,
            low: number(low_col, "Low")?,
            close: number(close_col, "Close")?,
            volume: volume as u64,
            iv_rank: number(iv_col, "IV_Rank")?,
        };
        bar.check(i).map_err(|e| match e {
            CondorError::InvariantViolation { reason, .. } => {
                data_err(format!("line {line}: {reason}"))
            }
            other => other,
        })?;
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.timestamp);
    if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(data_err(format!(
            "duplicate timestamp {}",
            pair[0].timestamp
        )));
    }
    Ok(bars)
}

/// Parses a blackout file. A missing `Reason` column or empty reason cell
/// yields `Unspecified`.
pub fn parse_blackout_csv(content: &str) -> Result<Vec<BlackoutWindow>, CondorError> {
    let mut rdr = reader(content);
    let headers = rdr
        .headers()
        .map_err(|e| data_err(format!("CSV header error: {}", e)))?
        .clone();

    let date_col = column_index(&headers, "Date")
        .ok_or_else(|| data_err("blackout CSV must contain a 'Date' column"))?;
    let reason_col = column_index(&headers, "Reason");

    let mut windows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record = result.map_err(|e| data_err(format!("CSV parse error: {}", e)))?;

        let raw = record
            .get(date_col)
            .ok_or_else(|| data_err(format!("line {line}: missing Date value")))?;
        let date = parse_date(raw)
            .ok_or_else(|| data_err(format!("line {line}: invalid Date '{raw}'")))?;
        let reason = reason_col
            .and_then(|c| record.get(c))
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_REASON);

        windows.push(BlackoutWindow::new(date, reason));
    }
    Ok(windows)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_timestamp(raw: &str, session: &SessionWindow) -> Result<DateTime<Tz>, String> {
    let tz = session.timezone;

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&tz));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return localize(naive, tz);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return localize(date.and_time(session.close), tz);
    }
    Err(format!("unrecognized timestamp '{raw}'"))
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>, String> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .ok_or_else(|| format!("local time {naive} does not exist in {}", tz.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::params::StrategyParameters;
    use chrono::Timelike;
    use chrono_tz::America::New_York;
    use tempfile::TempDir;

    const HEADER: &str = "Timestamp,Open,High,Low,Close,Volume,IV_Rank\n";

    fn session() -> SessionWindow {
        StrategyParameters::default().session
    }

    fn data_reason(err: CondorError) -> String {
        match err {
            CondorError::Data { reason } => reason,
            other => panic!("expected Data error, got {other:?}"),
        }
    }

    #[test]
    fn parses_and_sorts_rows() {
        let csv = format!(
            "{HEADER}\
             2024-01-16 10:00,105,115,100,110,60000,45\n\
             2024-01-15 10:00,100,110,90,105,50000,40\n"
        );
        let bars = parse_price_csv(&csv, &session()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[0].timestamp,
            New_York.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
        );
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[0].iv_rank, 40.0);
    }

    #[test]
    fn columns_in_any_order_with_padding() {
        let csv = " IV_Rank , Close,Open,High,Low,Volume,Timestamp\n\
                   50, 101,100,102,99,10,2024-01-15T10:30:00\n";
        let bars = parse_price_csv(csv, &session()).unwrap();
        assert_eq!(bars[0].close, 101.0);
        assert_eq!(bars[0].iv_rank, 50.0);
        assert_eq!(bars[0].timestamp.minute(), 30);
    }

    #[test]
    fn rfc3339_converted_to_session_zone() {
        let csv = format!("{HEADER}2024-01-15T15:00:00Z,100,101,99,100,1,50\n");
        let bars = parse_price_csv(&csv, &session()).unwrap();
        assert_eq!(
            bars[0].timestamp,
            New_York.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn bare_date_stamped_at_close() {
        let csv = format!("{HEADER}2024-01-15,100,101,99,100,1,50\n");
        let bars = parse_price_csv(&csv, &session()).unwrap();
        assert_eq!(bars[0].timestamp.hour(), 16);
        assert_eq!(bars[0].timestamp.minute(), 0);
    }

    #[test]
    fn dst_gap_shifts_forward() {
        // 2024-03-10 02:30 does not exist in New York
        let csv = format!("{HEADER}2024-03-10 02:30,100,101,99,100,1,50\n");
        let bars = parse_price_csv(&csv, &session()).unwrap();
        assert_eq!(bars[0].timestamp.hour(), 3);
    }

    #[test]
    fn missing_column_is_error() {
        let csv = "Timestamp,Open,High,Low,Close,Volume\n2024-01-15,1,1,1,1,1\n";
        let reason = data_reason(parse_price_csv(csv, &session()).unwrap_err());
        assert!(reason.contains("IV_Rank"));
    }

    #[test]
    fn bad_timestamp_is_error() {
        let csv = format!("{HEADER}yesterday,100,101,99,100,1,50\n");
        let reason = data_reason(parse_price_csv(&csv, &session()).unwrap_err());
        assert!(reason.contains("line 2"));
    }

    #[test]
    fn high_below_low_is_error() {
        let csv = format!("{HEADER}2024-01-15,100,99,101,100,1,50\n");
        let reason = data_reason(parse_price_csv(&csv, &session()).unwrap_err());
        assert!(reason.contains("high"));
    }

    #[test]
    fn iv_rank_out_of_range_is_error() {
        let csv = format!("{HEADER}2024-01-15,100,101,99,100,1,120\n");
        assert!(parse_price_csv(&csv, &session()).is_err());
    }

    #[test]
    fn negative_volume_is_error() {
        let csv = format!("{HEADER}2024-01-15,100,101,99,100,-5,50\n");
        let reason = data_reason(parse_price_csv(&csv, &session()).unwrap_err());
        assert!(reason.contains("Volume"));
    }

    #[test]
    fn duplicate_timestamp_is_error() {
        let csv = format!(
            "{HEADER}\
             2024-01-15 10:00,100,101,99,100,1,50\n\
             2024-01-15 10:00,100,101,99,100,1,50\n"
        );
        let reason = data_reason(parse_price_csv(&csv, &session()).unwrap_err());
        assert!(reason.contains("duplicate"));
    }

    #[test]
    fn blackouts_with_and_without_reason() {
        let with = parse_blackout_csv("Date,Reason\n2024-03-20,FOMC\n2024-04-10,\n").unwrap();
        assert_eq!(with.len(), 2);
        assert_eq!(with[0].reason, "FOMC");
        assert_eq!(with[1].reason, "Unspecified");

        let without = parse_blackout_csv("Date\n2024-03-20\n").unwrap();
        assert_eq!(without[0].reason, "Unspecified");
        assert_eq!(
            without[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
        );
    }

    #[test]
    fn blackout_without_date_column_is_error() {
        assert!(parse_blackout_csv("Day,Reason\n2024-03-20,FOMC\n").is_err());
    }

    #[test]
    fn blackout_bad_date_is_error() {
        assert!(parse_blackout_csv("Date\nnext tuesday\n").is_err());
    }

    #[test]
    fn adapter_reads_files() {
        let dir = TempDir::new().unwrap();
        let prices = dir.path().join("prices.csv");
        let blackouts = dir.path().join("blackouts.csv");
        fs::write(&prices, format!("{HEADER}2024-01-15,100,101,99,100,1,50\n")).unwrap();
        fs::write(&blackouts, "Date,Reason\n2024-01-17,CPI\n").unwrap();

        let adapter = CsvAdapter::new(prices, Some(blackouts));
        assert_eq!(adapter.load_bars(&session()).unwrap().len(), 1);
        assert_eq!(adapter.load_blackouts().unwrap()[0].reason, "CPI");
    }

    #[test]
    fn adapter_without_blackout_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().join("missing.csv"), None);
        assert!(adapter.load_blackouts().unwrap().is_empty());
        assert!(adapter.load_bars(&session()).is_err());
    }
}
