//! Error types for the tgdrive library.

use thiserror::Error;

use crate::media::MediaKind;

/// Errors that can occur while moving media from a group to remote storage.
#[derive(Error, Debug)]
pub enum Error {
    /// A required setting is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The group reference did not resolve to an accessible group.
    #[error("could not resolve group {reference:?}: {reason}")]
    Resolution {
        /// The reference as supplied by the user.
        reference: String,
        /// Why resolution failed.
        reason: String,
    },

    /// Downloading or uploading a single media item failed.
    #[error("{stage} of {kind} message {message_id} failed: {reason}")]
    Transfer {
        /// Which half of the transfer failed.
        stage: TransferStage,
        /// Media kind of the pass that was running.
        kind: MediaKind,
        /// Remote message id.
        message_id: i32,
        /// Underlying failure detail.
        reason: String,
    },

    /// Storage authorization (interactive grant or refresh) failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The storage API answered with something unusable.
    #[error("storage error: {0}")]
    Storage(String),

    /// Error reported by the messaging platform client.
    #[error("Telegram error: {0}")]
    Telegram(String),

    /// Some items failed while running with the continue-on-error policy.
    #[error("{failed} of {attempted} media item(s) failed to transfer")]
    Incomplete {
        /// Number of failed items.
        failed: usize,
        /// Number of items attempted.
        attempted: usize,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The half of a transfer that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Download,
    Upload,
}

impl std::fmt::Display for TransferStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Download => f.write_str("download"),
            Self::Upload => f.write_str("upload"),
        }
    }
}

impl Error {
    /// Builds a resolution error for `reference`.
    pub fn resolution(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}

/// A specialized `Result` type for tgdrive operations.
pub type Result<T> = std::result::Result<T, Error>;
