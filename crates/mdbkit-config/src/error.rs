use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating, parsing, or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// The commented default config could not be written.
    #[error("failed to create default config: {0}")]
    CreateDefault(String),

    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Parse(String),

    /// A value is out of range or malformed.
    #[error("validation error: {field}: {message}")]
    Validation {
        /// Dotted field path, e.g. `debugger.prompt`.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Reading or writing a config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
