//! Platform updater capability

use async_trait::async_trait;
use std::path::Path;

use super::model::{UpdateCheckResult, UpdateFlowStart};
use crate::core::error::Result;
use crate::core::types::{PackageHandoff, UpdateMode, UpdaterKind};

/// Platform-specific update flow, selected once at configuration time
#[async_trait]
pub trait PlatformUpdater: Send + Sync {
    fn kind(&self) -> UpdaterKind;

    /// Query the platform for an update
    async fn check_for_update(&self) -> Result<UpdateCheckResult>;

    /// Availability only; check failures propagate instead of reading as `false`
    async fn is_update_available(&self) -> Result<bool> {
        Ok(self.check_for_update().await?.update_available)
    }

    /// Begin a store-managed update flow
    async fn start_update(&self, mode: UpdateMode) -> Result<UpdateFlowStart>;

    /// Finish a flexible update; `staged` is the last downloaded package, if any
    async fn complete_update(&self, staged: Option<&Path>) -> Result<()>;

    /// How this platform deals with a package URL
    fn package_handoff(&self) -> PackageHandoff;

    /// Hand a downloaded package to the OS installer
    async fn install_package(&self, path: &Path) -> Result<()>;
}
