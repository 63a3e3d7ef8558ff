//! Sync error taxonomy.
//!
//! Every failure inside a sync attempt is one of these. The orchestrator turns
//! them into a `SyncResult` and a persisted `lastSyncError`; none of them
//! reach callers as an `Err`.

use serde::{Deserialize, Serialize};

/// High-level error classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncErrorKind {
    /// Sync disabled or credentials incomplete. Reported as `skipped`.
    Configuration,
    /// Transport policy rejected the endpoint (e.g. plaintext HTTP).
    Validation,
    /// Network or HTTP failure on a remote operation.
    Transport,
    /// Importing remote bookmarks into the local library failed.
    Merge,
    /// Reading from or writing to a local store failed.
    Store,
    /// A bundle could not be encoded or decoded.
    Serialization,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error("sync not configured: {0}")]
    Configuration(String),
    #[error("{0}")]
    Validation(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("merge failed: {0}")]
    Merge(String),
    #[error("local store error: {0}")]
    Store(String),
    #[error("invalid bundle: {0}")]
    Serialization(String),
}

impl SyncError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            Self::Configuration(_) => SyncErrorKind::Configuration,
            Self::Validation(_) => SyncErrorKind::Validation,
            Self::Transport(_) => SyncErrorKind::Transport,
            Self::Merge(_) => SyncErrorKind::Merge,
            Self::Store(_) => SyncErrorKind::Store,
            Self::Serialization(_) => SyncErrorKind::Serialization,
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<SyncError> for String {
    fn from(e: SyncError) -> String {
        e.to_string()
    }
}
