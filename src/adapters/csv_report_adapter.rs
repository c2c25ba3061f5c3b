//! CSV report adapter implementing ReportPort.
//!
//! Writes four files into the output directory: `trades.csv`,
//! `rejected.csv`, `metrics.csv` and `equity.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::analytics::AnalyticsSummary;
use crate::domain::error::CondorError;
use crate::domain::params::{BufferUnit, PositionHorizon, StrategyParameters};
use crate::domain::runner::SimulationOutput;
use crate::ports::report_port::ReportPort;

pub const TRADES_FILE: &str = "trades.csv";
pub const REJECTED_FILE: &str = "rejected.csv";
pub const METRICS_FILE: &str = "metrics.csv";
pub const EQUITY_FILE: &str = "equity.csv";

pub struct CsvReportAdapter {
    directory: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn writer(&self, name: &str) -> Result<csv::Writer<fs::File>, CondorError> {
        csv::Writer::from_path(self.directory.join(name)).map_err(csv_err)
    }
}

fn csv_err(e: csv::Error) -> CondorError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => CondorError::Io(io),
        other => CondorError::Data {
            reason: format!("CSV write error: {:?}", other),
        },
    }
}

fn round2(value: f64) -> String {
    format!("{:.2}", value)
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        output: &SimulationOutput,
        params: &StrategyParameters,
    ) -> Result<(), CondorError> {
        fs::create_dir_all(&self.directory)?;
        write_trades(self.writer(TRADES_FILE)?, output)?;
        write_rejections(self.writer(REJECTED_FILE)?, output)?;
        write_metrics(self.writer(METRICS_FILE)?, output.summary(), params)?;
        write_equity(self.writer(EQUITY_FILE)?, output.summary())?;
        Ok(())
    }
}

fn write_trades(
    mut w: csv::Writer<fs::File>,
    output: &SimulationOutput,
) -> Result<(), CondorError> {
    w.write_record([
        "Trade ID",
        "Entry Timestamp",
        "Exit Timestamp",
        "Expiry Date",
        "Upper Strike",
        "Lower Strike",
        "Credit Received",
        "P&L",
        "Exit Reason",
        "Breach Side",
        "Forced Close",
        "ADX at Entry",
        "RSI at Entry",
        "IV Rank at Entry",
        "EMA at Entry",
    ])
    .map_err(csv_err)?;

    for t in output.trades() {
        w.write_record([
            t.id().to_string(),
            t.entry_time().to_rfc3339(),
            t.exit_time().to_rfc3339(),
            t.expiry_date().map(|d| d.to_string()).unwrap_or_default(),
            t.upper_strike().to_string(),
            t.lower_strike().to_string(),
            t.credit().to_string(),
            t.pnl().to_string(),
            t.exit_reason().to_string(),
            t.breach_side()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            t.forced_close().to_string(),
            round2(t.entry_adx()),
            round2(t.entry_rsi()),
            round2(t.entry_iv_rank()),
            round2(t.entry_ema()),
        ])
        .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

fn write_rejections(
    mut w: csv::Writer<fs::File>,
    output: &SimulationOutput,
) -> Result<(), CondorError> {
    w.write_record([
        "Timestamp",
        "Rejection Reason",
        "Detail",
        "Close",
        "ADX",
        "RSI",
        "IV Rank",
    ])
    .map_err(csv_err)?;

    for r in output.rejections() {
        w.write_record([
            r.timestamp().to_rfc3339(),
            r.reason().to_string(),
            r.detail().to_string(),
            r.close().to_string(),
            round2(r.snapshot().adx),
            round2(r.snapshot().rsi),
            round2(r.iv_rank()),
        ])
        .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

fn write_metrics(
    mut w: csv::Writer<fs::File>,
    summary: &AnalyticsSummary,
    params: &StrategyParameters,
) -> Result<(), CondorError> {
    let horizon = match params.horizon {
        PositionHorizon::WeeklyExpiry { weekday } => format!("weekly ({weekday})"),
        PositionHorizon::Bars(n) => format!("{n} bars"),
    };
    let unit = match params.buffer_unit {
        BufferUnit::CalendarDays => "calendar days",
        BufferUnit::SessionDays => "session days",
    };

    let rows: Vec<(&str, String)> = vec![
        ("Total Trades", summary.total_trades.to_string()),
        ("Wins", summary.wins.to_string()),
        ("Losses", summary.losses.to_string()),
        ("Breakevens", summary.breakevens.to_string()),
        ("Breaches", summary.breaches.to_string()),
        ("Expiries", summary.expiries.to_string()),
        ("Total P&L", summary.total_pnl.to_string()),
        ("Win Rate", summary.win_rate.to_string()),
        ("Average Win", summary.avg_win.to_string()),
        ("Average Loss", summary.avg_loss.to_string()),
        ("Largest Win", summary.largest_win.to_string()),
        ("Largest Loss", summary.largest_loss.to_string()),
        ("Profit Factor", summary.profit_factor.to_string()),
        ("Expectancy", summary.expectancy.to_string()),
        ("Max Drawdown", summary.max_drawdown.to_string()),
        ("Credit", params.credit.to_string()),
        ("Max Loss", params.max_loss.to_string()),
        ("Horizon", horizon),
        (
            "Blackout Buffer",
            format!("{} {}", params.blackout_buffer, unit),
        ),
    ];

    w.write_record(["Metric", "Value"]).map_err(csv_err)?;
    for (name, value) in rows {
        w.write_record([name, value.as_str()]).map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

fn write_equity(
    mut w: csv::Writer<fs::File>,
    summary: &AnalyticsSummary,
) -> Result<(), CondorError> {
    w.write_record(["Timestamp", "Cumulative P&L", "Peak", "Drawdown"])
        .map_err(csv_err)?;
    for p in &summary.equity_curve {
        w.write_record([
            p.timestamp.to_rfc3339(),
            p.cumulative_pnl.to_string(),
            p.peak.to_string(),
            p.drawdown.to_string(),
        ])
        .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

/// Paths of every file a report run writes, for display.
pub fn report_files(directory: &Path) -> [PathBuf; 4] {
    [TRADES_FILE, REJECTED_FILE, METRICS_FILE, EQUITY_FILE].map(|name| directory.join(name))
}
