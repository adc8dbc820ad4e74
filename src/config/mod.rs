//! Configuration
//!
//! Layered loading with the `config` crate:
//! - Built-in defaults
//! - Optional file (format by extension: toml, json, yaml)
//! - Environment variables `UPDATE_BRIDGE__SECTION__KEY`

mod settings;

pub use settings::{BridgeConfig, ConfigError, ConfigResult, DownloadSettings, ENV_PREFIX};
