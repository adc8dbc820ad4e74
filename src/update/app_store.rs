//! Public store lookup updater
//!
//! The store offers no in-app update flow: checks go through the public
//! lookup API and both update modes open the app's store page.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use super::engine::decide_store;
use super::model::{StoreReport, UpdateCheckResult, UpdateFlowStart};
use super::updater::PlatformUpdater;
use crate::core::error::{BridgeError, Result};
use crate::core::types::{PackageHandoff, UpdateMode, UpdaterKind};
use crate::platform::PlatformLauncher;
use crate::version::is_newer;

/// Default public lookup endpoint
pub const DEFAULT_LOOKUP_URL: &str = "https://itunes.apple.com/lookup";

/// Store page for a track id
pub fn store_page_url(track_id: i64) -> String {
    format!("https://apps.apple.com/app/id{}", track_id)
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: Vec<LookupEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupEntry {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    track_id: Option<i64>,
    #[serde(default)]
    release_notes: Option<String>,
}

pub struct AppStoreUpdater {
    client: reqwest::Client,
    launcher: Arc<dyn PlatformLauncher>,
    lookup_url: String,
    bundle_id: String,
    current_version: String,
    track_id: Mutex<Option<i64>>,
}

impl AppStoreUpdater {
    pub fn new(
        client: reqwest::Client,
        launcher: Arc<dyn PlatformLauncher>,
        lookup_url: impl Into<String>,
        bundle_id: impl Into<String>,
        current_version: impl Into<String>,
    ) -> Self {
        Self {
            client,
            launcher,
            lookup_url: lookup_url.into(),
            bundle_id: bundle_id.into(),
            current_version: current_version.into(),
            track_id: Mutex::new(None),
        }
    }

    async fn lookup(&self) -> Result<LookupEntry> {
        let response = self
            .client
            .get(&self.lookup_url)
            .query(&[("bundleId", self.bundle_id.as_str())])
            .send()
            .await
            .map_err(|e| BridgeError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BridgeError::Network(format!(
                "Store lookup failed: HTTP {}",
                response.status().as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BridgeError::Network(e.to_string()))?;
        let lookup: LookupResponse = serde_json::from_str(&body)
            .map_err(|_| BridgeError::Parse("Cannot parse store response".to_string()))?;

        let entry = lookup
            .results
            .into_iter()
            .next()
            .ok_or_else(|| BridgeError::Parse(format!("No store listing for {}", self.bundle_id)))?;

        if let Some(track_id) = entry.track_id {
            *self.track_id.lock() = Some(track_id);
        }
        Ok(entry)
    }

    async fn store_url(&self) -> Result<String> {
        let cached = *self.track_id.lock();
        let track_id = match cached {
            Some(id) => id,
            None => self
                .lookup()
                .await?
                .track_id
                .ok_or_else(|| BridgeError::Parse("Store listing has no track id".to_string()))?,
        };
        Ok(store_page_url(track_id))
    }
}

#[async_trait]
impl PlatformUpdater for AppStoreUpdater {
    fn kind(&self) -> UpdaterKind {
        UpdaterKind::AppStore
    }

    async fn check_for_update(&self) -> Result<UpdateCheckResult> {
        let entry = self.lookup().await?;
        let remote_version = entry.version.unwrap_or_default();

        let report = StoreReport {
            update_available: is_newer(&remote_version, &self.current_version),
            remote_version,
            store_url: entry.track_id.map(store_page_url),
            release_notes: entry.release_notes,
            ..Default::default()
        };
        Ok(decide_store(&self.current_version, &report))
    }

    /// Both modes open the store page
    async fn start_update(&self, mode: UpdateMode) -> Result<UpdateFlowStart> {
        let url = self.store_url().await?;
        tracing::info!("No in-app {} flow on this store, opening {}", mode, url);
        self.launcher
            .open_url(&url)
            .map_err(|_| BridgeError::CannotOpenUrl { url: url.clone() })?;
        Ok(UpdateFlowStart::RedirectedToStore { url })
    }

    async fn complete_update(&self, _staged: Option<&Path>) -> Result<()> {
        Err(BridgeError::NotSupported(
            "Flexible updates are not supported by this store".to_string(),
        ))
    }

    fn package_handoff(&self) -> PackageHandoff {
        PackageHandoff::OpenUrl
    }

    async fn install_package(&self, _path: &Path) -> Result<()> {
        Err(BridgeError::NotSupported(
            "Packages cannot be installed outside the store".to_string(),
        ))
    }
}
