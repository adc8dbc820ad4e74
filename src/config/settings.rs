//! Bridge settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::core::types::UpdaterKind;
use crate::download::{DownloaderConfig, DEFAULT_CHUNK_SIZE};
use crate::logging::LoggingConfig;
use crate::update::DEFAULT_LOOKUP_URL;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "UPDATE_BRIDGE";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Package download settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadSettings {
    /// Directory downloaded packages are stored in
    pub download_dir: PathBuf,

    /// File name of the downloaded package
    pub package_file_name: String,

    /// Bytes per chunk write
    pub chunk_size: usize,

    pub request_timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// Report progress after every chunk instead of only on percent changes
    pub emit_every_chunk: bool,

    pub user_agent: Option<String>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        let download_dir = directories::BaseDirs::new()
            .map(|dirs| dirs.cache_dir().join("update-bridge").join("downloads"))
            .unwrap_or_else(|| PathBuf::from("downloads"));

        Self {
            download_dir,
            package_file_name: "update.apk".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout_secs: 300,
            connect_timeout_secs: 30,
            emit_every_chunk: false,
            user_agent: None,
        }
    }
}

impl DownloadSettings {
    /// Where the package download lands
    pub fn package_path(&self) -> PathBuf {
        self.download_dir.join(&self.package_file_name)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn downloader_config(&self) -> DownloaderConfig {
        let defaults = DownloaderConfig::default();
        DownloaderConfig {
            chunk_size: self.chunk_size,
            request_timeout: self.request_timeout(),
            connect_timeout: self.connect_timeout(),
            emit_every_chunk: self.emit_every_chunk,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

/// Top-level bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Platform update strategy
    pub updater: UpdaterKind,

    /// Version of the running app
    pub current_version: String,

    /// Update descriptor URL for direct updates
    pub update_url: Option<String>,

    /// Store bundle identifier (app store updater)
    pub bundle_id: Option<String>,

    /// Store lookup endpoint
    pub app_store_lookup_url: String,

    /// Overrides the reported platform version string
    pub platform_label: Option<String>,

    pub download: DownloadSettings,

    pub logging: LoggingConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            updater: UpdaterKind::default(),
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            update_url: None,
            bundle_id: None,
            app_store_lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            platform_label: None,
            download: DownloadSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load defaults, then `path` (when given), then environment overrides
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let defaults = ::config::Config::try_from(&BridgeConfig::default())?;
        let mut builder = ::config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            builder = builder.add_source(::config::File::from(path));
        }

        let config: BridgeConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!("Loaded configuration: updater={} version={}", config.updater, config.current_version);
        Ok(config)
    }

    /// Reject settings no updater can work with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.current_version.trim().is_empty() {
            return Err(ConfigError::Invalid("current_version must not be empty".to_string()));
        }
        if self.download.chunk_size == 0 {
            return Err(ConfigError::Invalid("download.chunk_size must be positive".to_string()));
        }
        if self.download.package_file_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "download.package_file_name must not be empty".to_string(),
            ));
        }
        if self.updater == UpdaterKind::AppStore
            && self.bundle_id.as_deref().map_or(true, |id| id.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "bundle_id is required for the app_store updater".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_updater(mut self, updater: UpdaterKind) -> Self {
        self.updater = updater;
        self
    }

    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = version.into();
        self
    }

    pub fn with_update_url(mut self, url: impl Into<String>) -> Self {
        self.update_url = Some(url.into());
        self
    }

    pub fn with_bundle_id(mut self, bundle_id: impl Into<String>) -> Self {
        self.bundle_id = Some(bundle_id.into());
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download.download_dir = dir.into();
        self
    }
}
