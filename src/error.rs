//! Error taxonomy for the config loading pipeline.
//!
//! Every failure aborts construction of the loader; nothing is partially
//! initialized. [`ValidationError`] covers rule violations and carries the
//! key, the constraint, and the offending value in its message.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// A violation raised by a rule function or by required-key enforcement.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required config key: '{0}'")]
    MissingRequiredKey(String),

    #[error("Config key '{key}' must be a string. Found: {found}")]
    NotAString { key: String, found: String },

    #[error("Config key '{key}' must be a non-empty string. Found: '{value}'")]
    EmptyString { key: String, value: String },

    #[error("Config key '{key}' must start with 'https://'. Found: '{value}'")]
    BadUrlScheme { key: String, value: String },

    #[error("Config key '{key}' must end with '/'. Found: '{value}'")]
    MissingTrailingSlash { key: String, value: String },

    #[error("Config key '{key}' must end with '_'. Found: '{value}'")]
    BadLogPrefix { key: String, value: String },

    #[error("Config key '{key}' must be an integer. Found: {found}")]
    NotAnInteger { key: String, found: String },

    #[error("Config key '{key}' must be greater than or equal to {min}. Found: {value}")]
    BelowMinimum { key: String, value: i64, min: i64 },

    #[error("Config key '{key}' must be less than or equal to {max}. Found: {value}")]
    AboveMaximum { key: String, value: i64, max: i64 },

    #[error(
        "Config key '{key}' must be a Bearer token in the format 'Bearer <UUID>'. Found: '{value}'"
    )]
    BadBearerToken { key: String, value: String },

    #[error("Config key '{key}' must be a date. Found: {found}")]
    NotADate { key: String, found: String },

    #[error("Config key '{key}' must not be earlier than {min}. Found: {value}")]
    DateBeforeMinimum {
        key: String,
        value: NaiveDate,
        min: NaiveDate,
    },

    #[error("Config key '{key}' has disallowed value '{value}'. Allowed values: {allowed:?}")]
    NotInAllowList {
        key: String,
        value: String,
        allowed: Vec<String>,
    },
}

/// Errors surfaced by [`crate::ConfigLoader`] construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The file '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("'{}' is a directory, not a file", .0.display())]
    IsADirectory(PathBuf),

    #[error("'{}' is not a YAML file. Must end with .yaml", .0.display())]
    WrongExtension(PathBuf),

    #[error("Error parsing YAML file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("YAML file '{}' does not contain a top-level mapping", .0.display())]
    TopLevelNotMapping(PathBuf),

    #[error("Config key '{raw}' collides with another key after normalizing to '{normalized}'")]
    DuplicateKey { raw: String, normalized: String },

    #[error("Config validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authentication path '{0}' does not exist or is not a valid file")]
    AuthPath(String),

    #[error("Error serializing config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
