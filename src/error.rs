//! Sync Error Types
//!
//! Error taxonomy for the synchronization engine:
//!
//! - `Precondition` - missing credential or tracking disabled; refused
//!   immediately, never retried automatically
//! - `Timeout` - a read batch exceeded its time budget; retried on the next
//!   scheduled tick
//! - `Cancelled` - superseded by a newer sync request; silently discarded
//! - `RemoteWrite` - a mutation failed; the optimistic record stays unsynced
//! - `Http` / `Serialization` - transport and decoding failures
//!
//! Cache I/O failures have no variant here: the local cache logs and swallows
//! them, leaving in-memory state authoritative for the session.

use thiserror::Error;

/// Errors produced by sync and mutation operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A required precondition was not met (no credential, tracking disabled)
    #[error("Precondition failed: {message}")]
    Precondition {
        /// Human-readable error message
        message: String,
    },

    /// A read batch exceeded its time budget
    #[error("Sync timeout")]
    Timeout,

    /// The operation was superseded by a newer sync request
    #[error("Sync cancelled")]
    Cancelled,

    /// A mutation's network call failed or the service returned a non-success
    /// result
    #[error("Remote write failed: {message}")]
    RemoteWrite {
        /// Human-readable error message
        message: String,
    },

    /// HTTP transport failure
    #[error("HTTP error: {message}")]
    Http {
        /// Human-readable error message
        message: String,
    },

    /// JSON encoding or decoding failure
    #[error("Serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },
}

impl SyncError {
    /// Create a new precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create a new remote-write error
    pub fn remote_write(message: impl Into<String>) -> Self {
        Self::RemoteWrite {
            message: message.into(),
        }
    }

    /// Create a new HTTP error
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether this error is operational (recorded in sync status but not
    /// surfaced to the caller as a blocking failure)
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Timeout | Self::Cancelled)
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::serialization(format!("Failed to parse response: {}", err))
        } else {
            Self::http(format!("Network error: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_error() {
        let error = SyncError::precondition("No authentication token found");
        match error {
            SyncError::Precondition { message } => {
                assert_eq!(message, "No authentication token found");
            }
            _ => panic!("Expected Precondition"),
        }
    }

    #[test]
    fn test_error_display() {
        let error = SyncError::remote_write("Failed to save mood entry: 500");
        let display = format!("{}", error);
        assert!(display.contains("Remote write failed"));
        assert!(display.contains("500"));
    }

    #[test]
    fn test_operational_errors() {
        assert!(SyncError::Timeout.is_operational());
        assert!(SyncError::Cancelled.is_operational());
        assert!(!SyncError::precondition("x").is_operational());
        assert!(!SyncError::remote_write("x").is_operational());
    }

    #[test]
    fn test_from_serde_error() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("{ invalid }");
        let error: SyncError = result.unwrap_err().into();
        match error {
            SyncError::Serialization { .. } => {}
            _ => panic!("Expected Serialization from serde error"),
        }
    }
}
