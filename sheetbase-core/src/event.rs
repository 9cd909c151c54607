//! Cache lifecycle state and the events a cache reports to its observers.

use crate::{EndpointError, PartitionKey};

/// Lifecycle of a document cache. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CacheState {
    /// No fetch attempted yet.
    Empty = 0,
    /// Initial fetch in flight.
    Loading = 1,
    /// Document populated, from the remote or from the fallback.
    Ready = 2,
}

impl CacheState {
    /// Decode the representation stored in an atomic cell.
    pub fn from_repr(repr: u8) -> Self {
        match repr {
            0 => Self::Empty,
            1 => Self::Loading,
            _ => Self::Ready,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Ready => "ready",
        }
    }
}

/// Outcome reported by a cache. The presentation layer decides how loudly to
/// surface each one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// The initial fetch failed and the fallback document was installed.
    FetchFailed {
        partition: PartitionKey,
        error: EndpointError,
    },
    /// Save job `sequence` reached the remote.
    SaveSucceeded {
        partition: PartitionKey,
        sequence: u64,
    },
    /// Save job `sequence` failed. It is not retried.
    SaveFailed {
        partition: PartitionKey,
        sequence: u64,
        error: EndpointError,
    },
}

impl CacheEvent {
    pub fn partition(&self) -> &PartitionKey {
        match self {
            Self::FetchFailed { partition, .. }
            | Self::SaveSucceeded { partition, .. }
            | Self::SaveFailed { partition, .. } => partition,
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::SaveSucceeded { .. })
    }

    pub fn error(&self) -> Option<&EndpointError> {
        match self {
            Self::FetchFailed { error, .. } | Self::SaveFailed { error, .. } => Some(error),
            Self::SaveSucceeded { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_repr_roundtrip() {
        for state in [CacheState::Empty, CacheState::Loading, CacheState::Ready] {
            assert_eq!(CacheState::from_repr(state as u8), state);
        }
    }

    #[test]
    fn test_event_accessors() {
        let partition = PartitionKey::new("alpha").unwrap();
        let ok = CacheEvent::SaveSucceeded {
            partition: partition.clone(),
            sequence: 3,
        };
        assert!(!ok.is_failure());
        assert!(ok.error().is_none());
        assert_eq!(ok.partition(), &partition);

        let failed = CacheEvent::FetchFailed {
            partition,
            error: EndpointError::transport("connection refused"),
        };
        assert!(failed.is_failure());
        assert_eq!(failed.error().map(|e| e.kind()), Some("transport"));
    }
}
