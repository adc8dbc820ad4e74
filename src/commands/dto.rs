//! Command argument and response types
//!
//! Field names follow the host's camelCase method-channel conventions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

/// Arguments for `checkForUpdate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckForUpdateArgs {
    /// Ask the platform store instead of a direct update URL
    #[serde(default = "default_true", alias = "usePlayStore", alias = "useAppStore")]
    pub use_platform_store: bool,
    #[serde(default)]
    pub update_url: Option<String>,
    #[serde(default)]
    pub current_version: Option<String>,
}

impl Default for CheckForUpdateArgs {
    fn default() -> Self {
        Self {
            use_platform_store: true,
            update_url: None,
            current_version: None,
        }
    }
}

impl CheckForUpdateArgs {
    /// Direct check against `update_url`
    pub fn direct(update_url: impl Into<String>, current_version: impl Into<String>) -> Self {
        Self {
            use_platform_store: false,
            update_url: Some(update_url.into()),
            current_version: Some(current_version.into()),
        }
    }
}

/// Arguments for `downloadAndInstallApk`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadArgs {
    #[serde(default)]
    pub download_url: Option<String>,
    /// Hex SHA-256 the package must match
    #[serde(default)]
    pub sha256: Option<String>,
}

impl DownloadArgs {
    pub fn new(download_url: impl Into<String>) -> Self {
        Self {
            download_url: Some(download_url.into()),
            sha256: None,
        }
    }
}

/// What `downloadAndInstallApk` did with the package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PackageDelivery {
    /// Downloaded and handed to the installer
    Installed { path: PathBuf, bytes: u64 },
    /// Handed to the OS as a URL
    OpenedUrl { url: String },
}
