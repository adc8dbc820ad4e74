//! Error types for the update bridge
//!
//! Every command surfaces failures through [`BridgeError`], which maps onto a
//! stable string code the host can switch on. [`CommandError`] is the
//! serializable form handed back across the host boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::download::DownloadError;
use crate::platform::LaunchError;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Main error type for the update bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Install failed: {0}")]
    InstallFailed(String),

    #[error("No downloaded update is ready to install")]
    NoDownload,

    #[error("Activity is not available")]
    NoActivity,

    #[error("Not available: {0}")]
    NotAvailable(String),

    #[error("Update not available: {0}")]
    UpdateNotAvailable(String),

    #[error("Update check failed: {0}")]
    UpdateCheckFailed(String),

    #[error("Availability check failed: {0}")]
    CheckFailed(String),

    #[error("Update flow failed: {0}")]
    UpdateFailed(String),

    #[error("Completing the update failed: {0}")]
    CompleteUpdateFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Download cancelled")]
    DownloadCancelled,

    #[error("Cannot open URL: {url}")]
    CannotOpenUrl { url: String },

    #[error("Method not implemented: {method}")]
    NotImplemented { method: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Stable code reported to the host
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::InvalidArguments(_) => "INVALID_ARGUMENTS",
            BridgeError::Network(_) => "NETWORK_ERROR",
            BridgeError::Parse(_) => "PARSE_ERROR",
            BridgeError::NotSupported(_) => "NOT_SUPPORTED",
            BridgeError::InstallFailed(_) => "INSTALL_FAILED",
            BridgeError::NoDownload => "NO_DOWNLOAD",
            BridgeError::NoActivity => "NO_ACTIVITY",
            BridgeError::NotAvailable(_) => "NOT_AVAILABLE",
            BridgeError::UpdateNotAvailable(_) => "UPDATE_NOT_AVAILABLE",
            BridgeError::UpdateCheckFailed(_) => "UPDATE_CHECK_FAILED",
            BridgeError::CheckFailed(_) => "CHECK_FAILED",
            BridgeError::UpdateFailed(_) => "UPDATE_FAILED",
            BridgeError::CompleteUpdateFailed(_) => "COMPLETE_UPDATE_FAILED",
            BridgeError::DownloadFailed(_) => "DOWNLOAD_FAILED",
            BridgeError::DownloadCancelled => "DOWNLOAD_CANCELLED",
            BridgeError::CannotOpenUrl { .. } => "CANNOT_OPEN_URL",
            BridgeError::NotImplemented { .. } => "NOT_IMPLEMENTED",
            BridgeError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the caller may reasonably retry the whole operation
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::Network(_) | BridgeError::DownloadFailed(_))
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BridgeError::Parse(err.to_string())
        } else {
            BridgeError::Network(err.to_string())
        }
    }
}

impl From<DownloadError> for BridgeError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Cancelled => BridgeError::DownloadCancelled,
            DownloadError::Network(_) | DownloadError::HttpStatus { .. } | DownloadError::Stream(_) => {
                BridgeError::Network(err.to_string())
            }
            other => BridgeError::DownloadFailed(other.to_string()),
        }
    }
}

impl From<LaunchError> for BridgeError {
    fn from(err: LaunchError) -> Self {
        BridgeError::InstallFailed(err.to_string())
    }
}

/// Structured error handed back to the host for request/response calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
    /// Stable error code (e.g. `NETWORK_ERROR`)
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl From<BridgeError> for CommandError {
    fn from(err: BridgeError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
