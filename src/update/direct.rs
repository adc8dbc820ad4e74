//! Direct-URL update checks and the updater built on them

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::engine::decide_direct;
use super::model::{UpdateCheckResult, UpdateDescriptor, UpdateFlowStart};
use super::updater::PlatformUpdater;
use crate::core::error::{BridgeError, Result};
use crate::core::types::{PackageHandoff, UpdateMode, UpdaterKind};
use crate::platform::PlatformLauncher;

/// Fetches an [`UpdateDescriptor`] and decides availability against the local version
#[derive(Debug, Clone)]
pub struct DirectUpdateChecker {
    client: reqwest::Client,
}

impl DirectUpdateChecker {
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| BridgeError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET `update_url` and parse the descriptor
    pub async fn fetch_descriptor(&self, update_url: &str) -> Result<UpdateDescriptor> {
        tracing::debug!("Fetching update descriptor from {}", update_url);

        let response = self
            .client
            .get(update_url)
            .send()
            .await
            .map_err(|e| BridgeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Network(format!(
                "Failed to check for updates: HTTP {}",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BridgeError::Network(e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| BridgeError::Parse(format!("Invalid update descriptor: {}", e)))
    }

    /// Full direct check: fetch then decide
    pub async fn check(&self, update_url: &str, current_version: &str) -> Result<UpdateCheckResult> {
        let descriptor = self.fetch_descriptor(update_url).await?;
        let result = decide_direct(current_version, &descriptor);
        tracing::info!(
            "Direct check: current {} remote {} available={} urgency={}",
            result.current_version,
            result.remote_version,
            result.update_available,
            result.urgency()
        );
        Ok(result)
    }
}

/// Updater for apps distributed outside any store
pub struct DirectUrlUpdater {
    checker: DirectUpdateChecker,
    launcher: Arc<dyn PlatformLauncher>,
    update_url: Option<String>,
    current_version: String,
    installed: Mutex<Option<PathBuf>>,
}

impl DirectUrlUpdater {
    pub fn new(
        checker: DirectUpdateChecker,
        launcher: Arc<dyn PlatformLauncher>,
        update_url: Option<String>,
        current_version: impl Into<String>,
    ) -> Self {
        Self {
            checker,
            launcher,
            update_url,
            current_version: current_version.into(),
            installed: Mutex::new(None),
        }
    }

    /// Package most recently handed to the installer
    pub fn last_installed(&self) -> Option<PathBuf> {
        self.installed.lock().clone()
    }

    fn update_url(&self) -> Result<&str> {
        self.update_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| BridgeError::InvalidArguments("No update URL configured".to_string()))
    }
}

#[async_trait]
impl PlatformUpdater for DirectUrlUpdater {
    fn kind(&self) -> UpdaterKind {
        UpdaterKind::DirectUrl
    }

    async fn check_for_update(&self) -> Result<UpdateCheckResult> {
        let url = self.update_url()?;
        self.checker.check(url, &self.current_version).await
    }

    async fn start_update(&self, mode: UpdateMode) -> Result<UpdateFlowStart> {
        Err(BridgeError::NotSupported(format!(
            "{} updates require a store; use downloadAndInstallApk",
            mode
        )))
    }

    async fn complete_update(&self, staged: Option<&Path>) -> Result<()> {
        match staged {
            Some(path) if path.is_file() => self.install_package(path).await,
            _ => Err(BridgeError::NoDownload),
        }
    }

    fn package_handoff(&self) -> PackageHandoff {
        PackageHandoff::DownloadAndInstall
    }

    async fn install_package(&self, path: &Path) -> Result<()> {
        self.launcher.install_package(path)?;
        *self.installed.lock() = Some(path.to_path_buf());
        Ok(())
    }
}
