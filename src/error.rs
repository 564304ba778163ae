//! Collaborator error types

use thiserror::Error;

/// Failure of an external collaborator (messaging, search, storage)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {message}")]
pub struct CollaboratorError {
    pub kind: CollaboratorErrorKind,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(kind: CollaboratorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(CollaboratorErrorKind::Network, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(CollaboratorErrorKind::Api, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(CollaboratorErrorKind::Storage, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(CollaboratorErrorKind::Decode, message)
    }
}

/// Error classification for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorErrorKind {
    /// Connection failures, timeouts
    Network,
    /// Remote API rejected the call
    Api,
    /// Local database failure
    Storage,
    /// Unexpected response shape
    Decode,
}
