//! Shared enums used across the command surface

use serde::{Deserialize, Serialize};

/// Platform update strategy, chosen at configuration time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdaterKind {
    /// Vendor in-app update service (app-store managed flexible/immediate flows)
    PlayStore,
    /// Public store lookup; update flows open the store page
    AppStore,
    /// Update descriptor and package served from a URL outside any store
    #[default]
    DirectUrl,
}

impl std::fmt::Display for UpdaterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdaterKind::PlayStore => write!(f, "play_store"),
            UpdaterKind::AppStore => write!(f, "app_store"),
            UpdaterKind::DirectUrl => write!(f, "direct_url"),
        }
    }
}

/// Update flow type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Download in the background while the app keeps running, install later
    Flexible,
    /// Blocking, foreground update
    Immediate,
}

impl std::fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateMode::Flexible => write!(f, "flexible"),
            UpdateMode::Immediate => write!(f, "immediate"),
        }
    }
}

/// How a platform hands a package URL over to the OS
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PackageHandoff {
    /// Download the package locally, then launch the package installer
    DownloadAndInstall,
    /// Open the URL and let the OS decide (no sideloading)
    OpenUrl,
}
