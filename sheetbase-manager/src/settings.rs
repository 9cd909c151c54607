//! Local key/value settings, persisted as a flat JSON object.

use crate::error::SettingsError;
use sheetbase_client::parse_endpoint_url;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key holding the operator's endpoint URL.
pub const SCRIPT_URL_KEY: &str = "scriptUrl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl LocalSettings {
    /// Load settings from `path`. A missing file yields empty settings.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                values: BTreeMap::new(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let values = if contents.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&contents).map_err(|e| SettingsError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        };
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(&self.path, e))?;
        }
        let contents = serde_json::to_string_pretty(&self.values).map_err(|e| {
            SettingsError::Parse {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        std::fs::write(&self.path, contents).map_err(|e| io_error(&self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn script_url(&self) -> Option<&str> {
        self.get(SCRIPT_URL_KEY).filter(|url| !url.trim().is_empty())
    }

    /// Store a trimmed endpoint URL after checking the HTTP client accepts it.
    pub fn set_script_url(&mut self, url: &str) -> Result<(), sheetbase_core::ConfigError> {
        let url = url.trim();
        parse_endpoint_url(SCRIPT_URL_KEY, url)?;
        self.set(SCRIPT_URL_KEY, url);
        Ok(())
    }
}

fn io_error(path: &Path, err: std::io::Error) -> SettingsError {
    SettingsError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
