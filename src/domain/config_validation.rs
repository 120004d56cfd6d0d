//! Configuration validation.
//!
//! Validates config fields before any dataset is read. Every key is optional
//! except the dataset paths, which `validate_data_paths` checks separately
//! because the command line may supply them instead.

use crate::domain::deviation::MissingYearPolicy;
use crate::domain::error::RedblueError;
use crate::domain::record::{DEFAULT_INTAKE_HEADER, DEFAULT_OUTFLOW_HEADER};
use crate::ports::config_port::{ConfigPort, parse_bool};

pub const COLUMN_KEYS: [&str; 5] = ["state", "year", "party", "intake", "outflow"];

pub const OUTPUT_FORMATS: [&str; 2] = ["text", "csv"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), RedblueError> {
    validate_columns(config)?;
    validate_red_party(config)?;
    validate_missing_year(config)?;
    validate_reject_overlap(config)?;
    validate_output_format(config)?;
    Ok(())
}

pub fn validate_data_paths(config: &dyn ConfigPort) -> Result<(), RedblueError> {
    for key in ["election_path", "financial_path"] {
        match config.get_string("data", key) {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(RedblueError::ConfigMissing {
                    section: "data".to_string(),
                    key: key.to_string(),
                })
            }
        }
    }
    Ok(())
}

fn validate_columns(config: &dyn ConfigPort) -> Result<(), RedblueError> {
    for key in COLUMN_KEYS {
        if let Some(name) = config.get_string("columns", key) {
            if name.trim().is_empty() {
                return Err(RedblueError::ConfigInvalid {
                    section: "columns".to_string(),
                    key: key.to_string(),
                    reason: "column name must not be blank".to_string(),
                });
            }
        }
    }

    let resolved = |key: &str, default: &str| {
        config
            .get_string("columns", key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default.to_string())
    };
    if resolved("intake", DEFAULT_INTAKE_HEADER) == resolved("outflow", DEFAULT_OUTFLOW_HEADER) {
        return Err(RedblueError::ConfigInvalid {
            section: "columns".to_string(),
            key: "outflow".to_string(),
            reason: "intake and outflow must name different columns".to_string(),
        });
    }
    Ok(())
}

fn validate_red_party(config: &dyn ConfigPort) -> Result<(), RedblueError> {
    match config.get_string("analysis", "red_party") {
        Some(s) if s.trim().is_empty() => Err(RedblueError::ConfigInvalid {
            section: "analysis".to_string(),
            key: "red_party".to_string(),
            reason: "red_party must not be blank".to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_missing_year(config: &dyn ConfigPort) -> Result<(), RedblueError> {
    if let Some(value) = config.get_string("analysis", "missing_year") {
        value
            .parse::<MissingYearPolicy>()
            .map_err(|reason| RedblueError::ConfigInvalid {
                section: "analysis".to_string(),
                key: "missing_year".to_string(),
                reason,
            })?;
    }
    Ok(())
}

fn validate_reject_overlap(config: &dyn ConfigPort) -> Result<(), RedblueError> {
    match config.get_string("analysis", "reject_overlap") {
        Some(value) if parse_bool(&value).is_none() => Err(RedblueError::ConfigInvalid {
            section: "analysis".to_string(),
            key: "reject_overlap".to_string(),
            reason: format!("expected true or false, got {value:?}"),
        }),
        _ => Ok(()),
    }
}

fn validate_output_format(config: &dyn ConfigPort) -> Result<(), RedblueError> {
    if let Some(value) = config.get_string("output", "format") {
        let value = value.trim().to_lowercase();
        if !OUTPUT_FORMATS.contains(&value.as_str()) {
            return Err(RedblueError::ConfigInvalid {
                section: "output".to_string(),
                key: "format".to_string(),
                reason: format!("format must be one of {}", OUTPUT_FORMATS.join(", ")),
            });
        }
    }
    Ok(())
}
