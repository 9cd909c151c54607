//! Configuration loading for sheetbase clients.
//!
//! All fields are required unless explicitly marked optional.

use crate::schema::{DocumentSchema, FieldSpec};
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SHEETBASE_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetbaseConfig {
    /// Remote endpoint. When absent, the `scriptUrl` local setting is used.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    pub request_timeout_ms: u64,
    /// Local key/value settings file.
    pub settings_path: PathBuf,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Overrides the standard site schema.
    #[serde(default)]
    pub schema: Option<SchemaConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    pub fields: Vec<FieldSpec>,
}

impl SheetbaseConfig {
    /// Load from `explicit`, falling back to `SHEETBASE_CONFIG`.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.endpoint_url {
            validate_endpoint_url("endpoint_url", url)?;
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms".to_string(),
                value: "0".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if self.settings_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "settings_path".to_string(),
            });
        }
        if let Some(schema) = &self.schema {
            if schema.fields.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "schema.fields".to_string(),
                    value: "[]".to_string(),
                    reason: "must declare at least one field".to_string(),
                });
            }
            if let Some(blank) = schema.fields.iter().find(|f| f.name.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: "schema.fields.name".to_string(),
                    value: blank.name.clone(),
                    reason: "must not be blank".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The document schema in effect: the configured one, or the site schema.
    pub fn document_schema(&self) -> DocumentSchema {
        match &self.schema {
            Some(schema) => DocumentSchema::new(schema.fields.iter().cloned()),
            None => DocumentSchema::site(),
        }
    }
}

/// Check that `url` is a non-empty http(s) URL.
pub fn validate_endpoint_url(field: &str, url: &str) -> Result<(), ConfigError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: url.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: url.to_string(),
            reason: "must be an http(s) URL".to_string(),
        }),
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from)
}
