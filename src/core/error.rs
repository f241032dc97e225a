//! Fatal error types
//!
//! Only configuration problems abort a run. Everything else is reported as a Finding.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid duration for '{field}': {value}")]
    InvalidDuration { field: &'static str, value: String },

    #[error("No endpoints configured")]
    NoEndpoints,

    #[error("Duplicate endpoint name: {0}")]
    DuplicateEndpoint(String),

    #[error("Base URL is empty")]
    EmptyBaseUrl,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Market endpoint '{0}' is configured but no symbols are tracked")]
    NoTrackedSymbols(String),
}
