//! Download session state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::error::{DownloadError, Result};
use crate::core::utils::generate_uuid;

/// Lifecycle state of a download session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl DownloadStatus {
    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadStatus::Completed | DownloadStatus::Failed | DownloadStatus::Cancelled
        )
    }

    fn can_transition_to(&self, next: DownloadStatus) -> bool {
        use DownloadStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (InProgress, InProgress)
                | (InProgress, Completed)
                | (Pending, Failed)
                | (InProgress, Failed)
                | (Pending, Cancelled)
                | (InProgress, Cancelled)
        )
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadStatus::Pending => write!(f, "pending"),
            DownloadStatus::InProgress => write!(f, "in_progress"),
            DownloadStatus::Completed => write!(f, "completed"),
            DownloadStatus::Failed => write!(f, "failed"),
            DownloadStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One transfer of a URL to a local file
///
/// Owned by the task performing the transfer; every state change goes
/// through a checked transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSession {
    pub id: Uuid,
    pub url: String,
    pub destination: PathBuf,
    pub total_bytes: Option<u64>,
    pub bytes_transferred: u64,
    pub chunks_written: u64,
    pub status: DownloadStatus,
    pub failure: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl DownloadSession {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            id: generate_uuid(),
            url: url.into(),
            destination: destination.into(),
            total_bytes: None,
            bytes_transferred: 0,
            chunks_written: 0,
            status: DownloadStatus::Pending,
            failure: None,
            started_at: Utc::now(),
        }
    }

    fn transition(&mut self, next: DownloadStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(DownloadError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Response headers arrived; `total` is the advertised body length
    pub fn begin(&mut self, total: Option<u64>) -> Result<()> {
        if self.status != DownloadStatus::Pending {
            return Err(DownloadError::InvalidTransition {
                from: self.status,
                to: DownloadStatus::InProgress,
            });
        }
        self.transition(DownloadStatus::InProgress)?;
        self.total_bytes = total;
        Ok(())
    }

    /// A chunk of `len` bytes was written
    pub fn record_chunk(&mut self, len: u64) -> Result<()> {
        if self.status != DownloadStatus::InProgress {
            return Err(DownloadError::InvalidTransition {
                from: self.status,
                to: DownloadStatus::InProgress,
            });
        }
        self.bytes_transferred += len;
        self.chunks_written += 1;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<()> {
        self.transition(DownloadStatus::Completed)
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(DownloadStatus::Failed)?;
        self.failure = Some(reason.into());
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.transition(DownloadStatus::Cancelled)
    }

    /// Elapsed time since the session was created
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}
