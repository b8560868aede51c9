// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors that stop a run before or after scanning.
///
/// Probe failures never show up here: detection modules turn them into Low
/// findings, and delivery failures are reported as a `DeliveryResult`.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not read config file {path}: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    ConfigInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No targets found in {0}")]
    NoTargets(PathBuf),

    #[error("Could not read target list {path}: {source}")]
    TargetsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Duplicate module name in registry: {0}")]
    DuplicateModule(String),

    #[error("Incomplete scan results for target {target}: {message}")]
    IncompleteResults { target: String, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ScanError {
    /// Configuration problems are the only errors that abort a run before any
    /// target is checked.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::ConfigUnreadable { .. }
                | Self::ConfigInvalid { .. }
                | Self::NoTargets(_)
                | Self::TargetsUnreadable { .. }
                | Self::DuplicateModule(_)
        )
    }
}
