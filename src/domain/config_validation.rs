//! Configuration validation and parameter construction.
//!
//! Every recognized key is checked for syntax here; range rules live in
//! [`StrategyParameters::validated`]. Missing keys take their defaults.

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;

use crate::domain::error::CondorError;
use crate::domain::params::{BufferUnit, PositionHorizon, SessionWindow, StrategyParameters};
use crate::ports::config_port::ConfigPort;

const INTEGER_KEYS: [(&str, &str); 6] = [
    ("indicators", "ema_period"),
    ("indicators", "atr_period"),
    ("indicators", "adx_period"),
    ("indicators", "rsi_period"),
    ("blackout", "buffer"),
    ("position", "horizon_bars"),
];

const FLOAT_KEYS: [(&str, &str); 7] = [
    ("indicators", "atr_multiplier"),
    ("entry", "adx_threshold"),
    ("entry", "rsi_low"),
    ("entry", "rsi_high"),
    ("entry", "iv_rank_min"),
    ("position", "credit"),
    ("position", "max_loss"),
];

const BOOL_KEYS: [(&str, &str); 1] = [("entry", "one_entry_per_week")];

/// Reads, syntax-checks and range-checks every strategy key.
pub fn build_strategy_parameters(
    config: &dyn ConfigPort,
) -> Result<StrategyParameters, CondorError> {
    validate_integers(config)?;
    validate_floats(config)?;
    validate_bools(config)?;

    let d = StrategyParameters::default();

    let params = StrategyParameters {
        ema_period: period(config, "ema_period", d.ema_period)?,
        atr_period: period(config, "atr_period", d.atr_period)?,
        atr_multiplier: config.get_double("indicators", "atr_multiplier", d.atr_multiplier),
        adx_period: period(config, "adx_period", d.adx_period)?,
        rsi_period: period(config, "rsi_period", d.rsi_period)?,

        adx_threshold: config.get_double("entry", "adx_threshold", d.adx_threshold),
        rsi_low: config.get_double("entry", "rsi_low", d.rsi_low),
        rsi_high: config.get_double("entry", "rsi_high", d.rsi_high),
        iv_rank_min: config.get_double("entry", "iv_rank_min", d.iv_rank_min),
        one_entry_per_week: config.get_bool("entry", "one_entry_per_week", d.one_entry_per_week),

        credit: config.get_double("position", "credit", d.credit),
        max_loss: config.get_double("position", "max_loss", d.max_loss),

        blackout_buffer: blackout_buffer(config, d.blackout_buffer)?,
        buffer_unit: buffer_unit(config, d.buffer_unit)?,

        session: session_window(config, &d.session)?,
        horizon: horizon(config, d.horizon)?,
    };

    params.validated()
}

fn validate_integers(config: &dyn ConfigPort) -> Result<(), CondorError> {
    for (section, key) in INTEGER_KEYS {
        if let Some(raw) = config.get_string(section, key) {
            raw.trim().parse::<i64>().map_err(|_| {
                CondorError::invalid(section, key, format!("'{raw}' is not an integer"))
            })?;
        }
    }
    Ok(())
}

fn validate_floats(config: &dyn ConfigPort) -> Result<(), CondorError> {
    for (section, key) in FLOAT_KEYS {
        if let Some(raw) = config.get_string(section, key) {
            raw.trim().parse::<f64>().map_err(|_| {
                CondorError::invalid(section, key, format!("'{raw}' is not a number"))
            })?;
        }
    }
    Ok(())
}

fn validate_bools(config: &dyn ConfigPort) -> Result<(), CondorError> {
    for (section, key) in BOOL_KEYS {
        if let Some(raw) = config.get_string(section, key) {
            let known = matches!(
                raw.trim().to_lowercase().as_str(),
                "true" | "yes" | "1" | "false" | "no" | "0"
            );
            if !known {
                return Err(CondorError::invalid(
                    section,
                    key,
                    format!("'{raw}' is not a boolean"),
                ));
            }
        }
    }
    Ok(())
}

fn period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, CondorError> {
    let fallback = i64::try_from(default).unwrap_or(i64::MAX);
    let value = config.get_int("indicators", key, fallback);
    usize::try_from(value)
        .map_err(|_| CondorError::invalid("indicators", key, "period must be >= 1"))
}

fn blackout_buffer(config: &dyn ConfigPort, default: u32) -> Result<u32, CondorError> {
    let value = config.get_int("blackout", "buffer", i64::from(default));
    u32::try_from(value)
        .map_err(|_| CondorError::invalid("blackout", "buffer", "buffer must be >= 0"))
}

fn buffer_unit(config: &dyn ConfigPort, default: BufferUnit) -> Result<BufferUnit, CondorError> {
    let Some(raw) = config.get_string("blackout", "buffer_unit") else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "calendar" | "calendar_days" => Ok(BufferUnit::CalendarDays),
        "session" | "session_days" | "trading" => Ok(BufferUnit::SessionDays),
        _ => Err(CondorError::invalid(
            "blackout",
            "buffer_unit",
            format!("'{raw}' must be 'calendar' or 'session'"),
        )),
    }
}

fn session_window(
    config: &dyn ConfigPort,
    default: &SessionWindow,
) -> Result<SessionWindow, CondorError> {
    let timezone = match config.get_string("session", "timezone") {
        Some(raw) => raw.trim().parse::<Tz>().map_err(|_| {
            CondorError::invalid("session", "timezone", format!("unknown time zone '{raw}'"))
        })?,
        None => default.timezone,
    };

    Ok(SessionWindow {
        timezone,
        open: session_time(config, "open", default.open)?,
        close: session_time(config, "close", default.close)?,
    })
}

fn session_time(
    config: &dyn ConfigPort,
    key: &str,
    default: NaiveTime,
) -> Result<NaiveTime, CondorError> {
    let Some(raw) = config.get_string("session", key) else {
        return Ok(default);
    };
    parse_clock_time(raw.trim()).ok_or_else(|| {
        CondorError::invalid("session", key, format!("'{raw}' is not HH:MM or HH:MM:SS"))
    })
}

fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn horizon(
    config: &dyn ConfigPort,
    default: PositionHorizon,
) -> Result<PositionHorizon, CondorError> {
    let kind = config
        .get_string("position", "horizon")
        .map(|s| s.trim().to_lowercase());

    match kind.as_deref() {
        None | Some("weekly") => {
            let weekday = match config.get_string("position", "expiry_weekday") {
                Some(raw) => raw.trim().parse::<Weekday>().map_err(|_| {
                    CondorError::invalid(
                        "position",
                        "expiry_weekday",
                        format!("'{raw}' is not a weekday"),
                    )
                })?,
                None => match default {
                    PositionHorizon::WeeklyExpiry { weekday } => weekday,
                    PositionHorizon::Bars(_) => Weekday::Fri,
                },
            };
            Ok(PositionHorizon::WeeklyExpiry { weekday })
        }
        Some("bars") => {
            let bars = config.get_int("position", "horizon_bars", 5);
            usize::try_from(bars)
                .map(PositionHorizon::Bars)
                .map_err(|_| CondorError::invalid("position", "horizon_bars", "must be >= 1"))
        }
        Some(other) => Err(CondorError::invalid(
            "position",
            "horizon",
            format!("'{other}' must be 'weekly' or 'bars'"),
        )),
    }
}
