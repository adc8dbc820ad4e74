//! Download error types

use thiserror::Error;

use super::session::DownloadStatus;

/// Errors that end a download session
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server responded with HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Stream interrupted: {0}")]
    Stream(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download cancelled")]
    Cancelled,

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: DownloadStatus,
        to: DownloadStatus,
    },

    #[error("Download task ended unexpectedly: {0}")]
    TaskAborted(String),
}

/// Result type for download operations
pub type Result<T> = std::result::Result<T, DownloadError>;
