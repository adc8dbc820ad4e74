//! Vendor in-app update service seam
//!
//! Mirrors the shape of the Play in-app update API closely enough that a host
//! binding can forward each call one-to-one.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::core::types::UpdateMode;

/// Errors reported by the vendor service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Update service error {code}: {message}")]
    Api { code: i32, message: String },

    #[error("Update service unavailable: {0}")]
    Unavailable(String),
}

/// Store-side availability of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateAvailability {
    #[default]
    Unknown,
    NotAvailable,
    Available,
    /// A developer-triggered update is already running
    InProgress,
}

/// Snapshot returned by [`AppUpdateService::app_update_info`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppUpdateInfo {
    pub availability: UpdateAvailability,
    pub available_version_code: i64,
    pub immediate_allowed: bool,
    pub flexible_allowed: bool,
    /// 0..=5
    pub update_priority: i32,
}

impl AppUpdateInfo {
    pub fn is_mode_allowed(&self, mode: UpdateMode) -> bool {
        match mode {
            UpdateMode::Flexible => self.flexible_allowed,
            UpdateMode::Immediate => self.immediate_allowed,
        }
    }
}

/// Install progress of a flexible update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    Unknown,
    Pending,
    Downloading,
    Downloaded,
    Installing,
    Installed,
    Failed,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallState {
    pub status: InstallStatus,
    pub bytes_downloaded: u64,
    pub total_bytes_to_download: u64,
}

impl InstallState {
    pub fn new(status: InstallStatus) -> Self {
        Self {
            status,
            bytes_downloaded: 0,
            total_bytes_to_download: 0,
        }
    }

    pub fn downloading(bytes_downloaded: u64, total_bytes_to_download: u64) -> Self {
        Self {
            status: InstallStatus::Downloading,
            bytes_downloaded,
            total_bytes_to_download,
        }
    }
}

/// Callback invoked by the service on install state changes
pub type InstallStateListener = Arc<dyn Fn(InstallState) + Send + Sync>;

/// Handle identifying a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Vendor in-app update manager
#[async_trait]
pub trait AppUpdateService: Send + Sync {
    async fn app_update_info(&self) -> Result<AppUpdateInfo, ServiceError>;

    /// Launch the store-managed flow for `mode`
    async fn start_update_flow(&self, info: &AppUpdateInfo, mode: UpdateMode) -> Result<(), ServiceError>;

    /// Install a downloaded flexible update (restarts the app)
    async fn complete_update(&self) -> Result<(), ServiceError>;

    fn register_listener(&self, listener: InstallStateListener) -> ListenerId;

    fn unregister_listener(&self, id: ListenerId);
}
