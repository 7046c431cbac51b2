use regex::bytes::RegexBuilder;

use crate::config::Config;
use crate::error::ConfigError;

/// Check every field, returning all violations found.
pub fn validate(config: &Config) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let dbg = &config.debugger;

    if dbg.executable.trim().is_empty() {
        errors.push(ConfigError::Validation {
            field: "debugger.executable".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    for (field, pattern) in [
        ("debugger.prompt", &dbg.prompt),
        ("debugger.halted_pattern", &dbg.halted_pattern),
    ] {
        if pattern.is_empty() {
            errors.push(ConfigError::Validation {
                field: field.to_string(),
                message: "must not be empty".to_string(),
            });
        } else if let Err(e) = RegexBuilder::new(pattern).multi_line(true).build() {
            errors.push(ConfigError::Validation {
                field: field.to_string(),
                message: format!("invalid regex: {e}"),
            });
        }
    }

    if dbg.halt_marker.is_empty() {
        errors.push(ConfigError::Validation {
            field: "debugger.halt_marker".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
