//! Configuration validation.
//!
//! Validates every config field up front, before any data is fetched or a
//! run starts.

use chrono::NaiveDate;

use crate::domain::error::SignalbenchError;
use crate::domain::strategy;
use crate::ports::config_port::ConfigPort;

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    validate_initial_capital(config)?;
    validate_fee_rate(config)?;
    validate_dates(config)?;
    validate_strategies(config)?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    let value = config.get_double("simulation", "initial_capital", 1000.0);
    if value <= 0.0 {
        return Err(SignalbenchError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_fee_rate(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    let value = config.get_double("simulation", "fee_rate", 0.001);
    if !(0.0..1.0).contains(&value) {
        return Err(SignalbenchError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "fee_rate".to_string(),
            reason: "fee_rate must be in [0, 1)".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(SignalbenchError::ConfigInvalid {
                section: "data".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must be before end_date".to_string(),
            });
        }
    }
    Ok(())
}

/// Dates are optional (the evaluation window has defaults) but must be
/// well-formed when present.
fn parse_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, SignalbenchError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| SignalbenchError::ConfigInvalid {
                section: "data".to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", key),
            }),
    }
}

fn validate_strategies(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    let Some(list) = config.get_string("evaluation", "strategies") else {
        return Ok(());
    };
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        strategy::lookup(name)?;
    }
    Ok(())
}
