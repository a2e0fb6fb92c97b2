//! Error types for boardkit

use std::path::PathBuf;
use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors raised by a [`RemoteStore`](crate::remote::RemoteStore).
///
/// The optimistic engine never inspects the variant: every error means
/// "remote failure, roll back". The variants exist for logging and for
/// callers that talk to the store directly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The store could not be reached
    #[error("remote store unavailable: {message}")]
    Unavailable { message: String },

    /// The addressed entity does not exist remotely
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// The store refused the write
    #[error("remote store rejected the request: {message}")]
    Rejected { message: String },

    /// IO failure in a file-backed store
    #[error("IO error: {0}")]
    Io(String),

    /// Payload could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(String),
}

impl RemoteError {
    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a rejected error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Check if retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Io(_))
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Errors that can occur in board operations
#[derive(Debug, Error)]
pub enum BoardError {
    /// List not found on the board
    #[error("list not found: {id}")]
    ListNotFound { id: String },

    /// Card not found on the board
    #[error("card not found: {id}")]
    CardNotFound { id: String },

    /// Invalid field value
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Board file missing
    #[error("board not found at {path}")]
    BoardFileMissing { path: PathBuf },

    /// Remote store failure
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl BoardError {
    pub fn list_not_found(id: impl std::fmt::Display) -> Self {
        Self::ListNotFound { id: id.to_string() }
    }

    pub fn card_not_found(id: impl std::fmt::Display) -> Self {
        Self::CardNotFound { id: id.to_string() }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<figment::Error> for BoardError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BoardError::CardNotFound {
            id: "abc123".into(),
        };
        assert_eq!(err.to_string(), "card not found: abc123");

        let err = RemoteError::not_found("list", "l1");
        assert_eq!(err.to_string(), "list not found: l1");
    }

    #[test]
    fn test_remote_error_is_transparent() {
        let err = BoardError::from(RemoteError::unavailable("timeout"));
        assert_eq!(err.to_string(), "remote store unavailable: timeout");
    }

    #[test]
    fn test_retryable() {
        assert!(RemoteError::unavailable("x").is_retryable());
        assert!(!RemoteError::rejected("x").is_retryable());
        assert!(BoardError::Remote(RemoteError::Io("disk".into())).is_retryable());
        assert!(!BoardError::ListNotFound { id: "x".into() }.is_retryable());
    }
}
