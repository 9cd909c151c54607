//! Sheetbase Core - Document Types
//!
//! Shared data types for the sheetbase client: the cached JSON document,
//! partition keys, the document schema, cache events, configuration and the
//! error hierarchy. All other crates depend on this.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod error;
pub mod event;
pub mod schema;
pub mod value;

pub use config::{validate_endpoint_url, LogFormat, SchemaConfig, SheetbaseConfig};
pub use error::{
    CacheError, ConfigError, EndpointError, SheetbaseError, SheetbaseResult,
};
pub use event::{CacheEvent, CacheState};
pub use schema::{
    DocumentSchema, FieldKind, FieldSpec, ADMIN_CREDENTIALS_KEY, ADMIN_SESSION_KEY, SITE_COLLECTIONS,
};
pub use value::{copy_value, to_document_value};

// ============================================================================
// DOCUMENT
// ============================================================================

/// One partition's entire persisted state: string keys to arbitrary JSON.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A JSON value stored under a document key.
pub type JsonValue = serde_json::Value;

// ============================================================================
// PARTITION KEY
// ============================================================================

/// Identifier of one remotely stored document (a "project").
///
/// Keys are opaque to the client. The only rule is that they are non-blank;
/// surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Parse a partition key, rejecting blank input.
    pub fn new(key: impl AsRef<str>) -> Result<Self, ConfigError> {
        let trimmed = key.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "partition".to_string(),
                value: key.as_ref().to_string(),
                reason: "must not be blank".to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PartitionKey {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PartitionKey> for String {
    fn from(key: PartitionKey) -> Self {
        key.0
    }
}

impl std::str::FromStr for PartitionKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
