//! Error types for sheetbase operations

use thiserror::Error;

/// Failures talking to the remote spreadsheet endpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    /// A response arrived but was not a usable envelope.
    #[error("Protocol failure{}: {reason}", status_suffix(.status))]
    Protocol { status: Option<u16>, reason: String },

    /// A well-formed envelope reported `status: "error"`.
    #[error("Remote error: {message}")]
    Remote { message: String },
}

impl EndpointError {
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    pub fn protocol(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            reason: reason.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Short machine-friendly label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Protocol { .. } => "protocol",
            Self::Remote { .. } => "remote",
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or SHEETBASE_CONFIG)")]
    MissingConfigPath,

    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },

    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Document cache errors.
///
/// Fetch and save failures never surface here; the cache reports those as
/// events. Only caller-side mistakes do.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Value for key {key} is not JSON-serializable: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Value for key {key} does not match the requested type: {reason}")]
    Deserialization { key: String, reason: String },

    #[error("Save queue has shut down")]
    QueueClosed,
}

/// Master error type for all sheetbase errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SheetbaseError {
    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result type alias for sheetbase operations.
pub type SheetbaseResult<T> = Result<T, SheetbaseError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_error_display_protocol_with_status() {
        let err = EndpointError::protocol(Some(502), "bad gateway");
        let msg = format!("{}", err);
        assert!(msg.contains("Protocol failure"));
        assert!(msg.contains("HTTP 502"));
        assert!(msg.contains("bad gateway"));
    }

    #[test]
    fn test_endpoint_error_display_protocol_without_status() {
        let err = EndpointError::protocol(None, "expected value at line 1");
        assert_eq!(
            format!("{}", err),
            "Protocol failure: expected value at line 1"
        );
    }

    #[test]
    fn test_endpoint_error_kind() {
        assert_eq!(EndpointError::transport("refused").kind(), "transport");
        assert_eq!(EndpointError::protocol(None, "x").kind(), "protocol");
        assert_eq!(EndpointError::remote("sheet missing").kind(), "remote");
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "endpoint_url".to_string(),
            value: "ftp://x".to_string(),
            reason: "must be an http(s) URL".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("endpoint_url"));
        assert!(msg.contains("ftp://x"));
        assert!(msg.contains("http(s)"));
    }

    #[test]
    fn test_sheetbase_error_from_variants() {
        let endpoint = SheetbaseError::from(EndpointError::remote("nope"));
        assert!(matches!(endpoint, SheetbaseError::Endpoint(_)));

        let config = SheetbaseError::from(ConfigError::MissingConfigPath);
        assert!(matches!(config, SheetbaseError::Config(_)));

        let cache = SheetbaseError::from(CacheError::QueueClosed);
        assert!(matches!(cache, SheetbaseError::Cache(_)));
    }

    #[test]
    fn test_cache_error_from_config() {
        let err = CacheError::from(ConfigError::MissingRequired {
            field: "partition".to_string(),
        });
        assert!(format!("{}", err).contains("partition"));
    }
}
