//! Configuration validation.
//!
//! Checks every config field before a backtest runs. Keys that are absent
//! fall back to defaults later; keys that are present must parse and lie in
//! range.

use crate::domain::error::FxtraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), FxtraderError> {
    validate_data_config(config)?;
    validate_signal_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), FxtraderError> {
    if let Some(format) = config.get_string("data", "format") {
        if !matches!(format.trim().to_lowercase().as_str(), "investing" | "plain") {
            return Err(FxtraderError::invalid(
                "data",
                "format",
                "format must be 'investing' or 'plain'",
            ));
        }
    }

    let start = optional_date(config, "start_date")?;
    let end = optional_date(config, "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(FxtraderError::invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

pub fn validate_signal_config(config: &dyn ConfigPort) -> Result<(), FxtraderError> {
    if let Some(accuracy) = optional_double(config, "signal", "accuracy")? {
        if !(0.0..=1.0).contains(&accuracy) {
            return Err(FxtraderError::invalid(
                "signal",
                "accuracy",
                "accuracy must be between 0 and 1",
            ));
        }
    }
    if let Some(raw) = config.get_string("signal", "seed") {
        if raw.trim().parse::<u64>().is_err() {
            return Err(FxtraderError::invalid(
                "signal",
                "seed",
                "seed must be a non-negative integer",
            ));
        }
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), FxtraderError> {
    if let Some(value) = optional_double(config, "backtest", "initial_capital")? {
        if value <= 0.0 {
            return Err(FxtraderError::invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
    }
    if let Some(value) = optional_double(config, "backtest", "position_fraction")? {
        if value <= 0.0 || value > 1.0 {
            return Err(FxtraderError::invalid(
                "backtest",
                "position_fraction",
                "position_fraction must be in (0, 1]",
            ));
        }
    }
    if let Some(value) = optional_double(config, "backtest", "stop_loss_fraction")? {
        if value <= 0.0 || value >= 1.0 {
            return Err(FxtraderError::invalid(
                "backtest",
                "stop_loss_fraction",
                "stop_loss_fraction must be in (0, 1)",
            ));
        }
    }
    if let Some(value) = optional_double(config, "backtest", "leverage")? {
        if value < 1.0 {
            return Err(FxtraderError::invalid(
                "backtest",
                "leverage",
                "leverage must be at least 1",
            ));
        }
    }
    if let Some(value) = optional_double(config, "backtest", "spread_pips")? {
        if value < 0.0 {
            return Err(FxtraderError::invalid(
                "backtest",
                "spread_pips",
                "spread_pips must be non-negative",
            ));
        }
    }
    if let Some(value) = optional_double(config, "backtest", "take_profit_fraction")? {
        if value <= 0.0 || value >= 1.0 {
            return Err(FxtraderError::invalid(
                "backtest",
                "take_profit_fraction",
                "take_profit_fraction must be in (0, 1)",
            ));
        }
    }
    Ok(())
}

fn optional_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, FxtraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(FxtraderError::invalid(
                section,
                key,
                format!("expected a number, got '{}'", raw.trim()),
            )),
        },
    }
}

pub fn optional_date(config: &dyn ConfigPort, field: &str) -> Result<Option<NaiveDate>, FxtraderError> {
    match config.get_string("data", field) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                FxtraderError::invalid(
                    "data",
                    field,
                    format!("invalid {} format, expected YYYY-MM-DD", field),
                )
            }),
    }
}
