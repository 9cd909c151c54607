//! Error types for the manager.

use sheetbase_core::{CacheError, ConfigError, EndpointError, SheetbaseError};

/// Local settings file failures.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Failed to access settings file {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("Settings file {path} is not a JSON object of strings: {reason}")]
    Parse { path: String, reason: String },
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("Project ID cannot be empty")]
    EmptyProjectId,
    #[error("No endpoint URL configured (set endpoint_url or run `sheetbase endpoint set <url>`)")]
    EndpointNotConfigured,
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl From<SheetbaseError> for ManagerError {
    fn from(err: SheetbaseError) -> Self {
        match err {
            SheetbaseError::Endpoint(e) => Self::Endpoint(e),
            SheetbaseError::Config(e) => Self::Config(e),
            SheetbaseError::Cache(e) => Self::Cache(e),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
