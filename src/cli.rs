//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::{CsvReportAdapter, report_files};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::build_strategy_parameters;
use crate::domain::error::CondorError;
use crate::domain::params::{BufferUnit, PositionHorizon, StrategyParameters};
use crate::domain::runner::{self, SimulationOutput};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "condor", about = "Short iron condor entry/exit backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation over a price file
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overrides [data] prices
        #[arg(short, long)]
        prices: Option<PathBuf>,
        /// Blackout CSV, overrides [data] blackouts
        #[arg(short, long)]
        blackouts: Option<PathBuf>,
        /// Output directory, overrides [output] directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file and print the resolved parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            prices,
            blackouts,
            output,
        } => run_simulation(&config, prices, blackouts, output),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, CondorError> {
    FileConfigAdapter::from_file(path)
}

/// A path from the config file is taken relative to the file's directory.
fn config_path(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    base: &Path,
) -> Option<PathBuf> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| base.join(s))
}

fn run_simulation(
    config_file: &Path,
    prices: Option<PathBuf>,
    blackouts: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), CondorError> {
    eprintln!("Loading config from {}", config_file.display());
    let config = load_config(config_file)?;
    let params = build_strategy_parameters(&config)?;
    let base = config_file.parent().unwrap_or(Path::new("."));

    let prices = prices
        .or_else(|| config_path(&config, "data", "prices", base))
        .ok_or_else(|| CondorError::ConfigMissing {
            section: "data".to_string(),
            key: "prices".to_string(),
        })?;
    let blackouts = blackouts.or_else(|| config_path(&config, "data", "blackouts", base));
    let output = output.or_else(|| config_path(&config, "output", "directory", base));

    let data = CsvAdapter::new(prices.clone(), blackouts.clone());
    eprintln!("Loading prices from {}", prices.display());
    let bars = data.load_bars(&params.session)?;
    if let Some(path) = &blackouts {
        eprintln!("Loading blackouts from {}", path.display());
    }
    let windows = data.load_blackouts()?;

    eprintln!(
        "Running simulation: {} bars, {} blackout dates",
        bars.len(),
        windows.len()
    );
    let result = runner::run(&bars, &windows, &params)?;
    print_summary(&result);

    if let Some(dir) = output {
        CsvReportAdapter::new(dir.clone()).write(&result, &params)?;
        eprintln!("\nReports written:");
        for path in report_files(&dir) {
            eprintln!("  {}", path.display());
        }
    }
    Ok(())
}

fn print_summary(output: &SimulationOutput) {
    let s = output.summary();
    eprintln!("\n=== Results ===");
    eprintln!("Bars Processed:   {}", output.bars_processed());
    eprintln!("Total Trades:     {}", s.total_trades);
    eprintln!(
        "Wins / Losses:    {} / {} ({} breakeven)",
        s.wins, s.losses, s.breakevens
    );
    eprintln!("Expiries:         {}", s.expiries);
    eprintln!("Breaches:         {}", s.breaches);
    eprintln!("Win Rate:         {:.1}%", s.win_rate * 100.0);
    eprintln!("Total P&L:        {:.2}", s.total_pnl);
    eprintln!("Average Win:      {:.2}", s.avg_win);
    eprintln!("Average Loss:     {:.2}", s.avg_loss);
    eprintln!("Profit Factor:    {:.2}", s.profit_factor);
    eprintln!("Expectancy:       {:.4}", s.expectancy);
    eprintln!("Max Drawdown:     {:.2}", s.max_drawdown);

    eprintln!("\n=== Rejections ===");
    for (reason, count) in output.rejection_counts() {
        eprintln!("  {:<24}{}", reason.as_str(), count);
    }
}

fn run_validate(config_file: &Path) -> Result<(), CondorError> {
    eprintln!("Loading config from {}", config_file.display());
    let config = load_config(config_file)?;
    let params = build_strategy_parameters(&config)?;
    eprintln!("Config validated successfully\n");
    print_parameters(&params);
    Ok(())
}

fn print_parameters(p: &StrategyParameters) {
    let horizon = match p.horizon {
        PositionHorizon::WeeklyExpiry { weekday } => format!("weekly, expires {weekday}"),
        PositionHorizon::Bars(n) => format!("{n} bars"),
    };
    let unit = match p.buffer_unit {
        BufferUnit::CalendarDays => "calendar days",
        BufferUnit::SessionDays => "session days",
    };

    println!("[indicators]");
    println!("  ema_period      {}", p.ema_period);
    println!("  atr_period      {}", p.atr_period);
    println!("  atr_multiplier  {}", p.atr_multiplier);
    println!("  adx_period      {}", p.adx_period);
    println!("  rsi_period      {}", p.rsi_period);
    println!("[entry]");
    println!("  adx_threshold   {}", p.adx_threshold);
    println!("  rsi_range       [{}, {}]", p.rsi_low, p.rsi_high);
    println!("  iv_rank_min     {}", p.iv_rank_min);
    println!("  one_per_week    {}", p.one_entry_per_week);
    println!("[session]");
    println!("  timezone        {}", p.session.timezone.name());
    println!("  window          {} - {}", p.session.open, p.session.close);
    println!("[blackout]");
    println!("  buffer          {} {}", p.blackout_buffer, unit);
    println!("[position]");
    println!("  credit          {}", p.credit);
    println!("  max_loss        {}", p.max_loss);
    println!("  horizon         {}", horizon);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_subcommand() {
        let cli = Cli::try_parse_from([
            "condor",
            "run",
            "--config",
            "condor.ini",
            "--prices",
            "spx.csv",
            "-o",
            "out",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                config,
                prices,
                blackouts,
                output,
            } => {
                assert_eq!(config, PathBuf::from("condor.ini"));
                assert_eq!(prices, Some(PathBuf::from("spx.csv")));
                assert_eq!(blackouts, None);
                assert_eq!(output, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_validate_subcommand() {
        let cli = Cli::try_parse_from(["condor", "validate", "-c", "condor.ini"]).unwrap();
        assert!(matches!(cli.command, Command::Validate { .. }));
    }

    #[test]
    fn run_requires_config() {
        assert!(Cli::try_parse_from(["condor", "run"]).is_err());
    }

    #[test]
    fn config_paths_resolve_against_config_dir() {
        let config = FileConfigAdapter::from_string("[data]\nprices = spx.csv\n").unwrap();
        let resolved = config_path(&config, "data", "prices", Path::new("/srv/condor"));
        assert_eq!(resolved, Some(PathBuf::from("/srv/condor/spx.csv")));
        assert_eq!(config_path(&config, "data", "blackouts", Path::new(".")), None);
    }
}
