//! app-update-bridge - check, download and install app updates
//!
//! This crate provides the core functionality for the update bridge including:
//! - Version comparison and update decisions (optional, high priority, mandatory)
//! - Platform update flows behind one capability trait (store-managed, store page, direct URL)
//! - Streamed package downloads with progress events and cancellation
//! - A command surface hosts drive by method name
//! - A mock update server for development and tests

pub mod commands;
pub mod config;
pub mod core;
pub mod download;
pub mod events;
pub mod logging;
pub mod platform;
pub mod server;
pub mod update;
pub mod version;

#[cfg(test)]
mod test_support;

// Re-export commonly used items
pub use crate::core::error::{BridgeError, CommandError, Result};
pub use crate::core::types::{PackageHandoff, UpdateMode, UpdaterKind};
pub use commands::{CheckForUpdateArgs, DownloadArgs, PackageDelivery, UpdateBridge};
pub use config::BridgeConfig;
pub use download::{DownloadEvent, DownloadRequest, Downloader, ProgressEvent};
pub use events::{ChannelSink, EventSink, FlowResult, TracingSink, UpdateEvent};
pub use platform::{LogOnlyLauncher, PlatformLauncher, SystemLauncher};
pub use server::{MockServerConfig, MockUpdateServer};
pub use update::{PlatformUpdater, UpdateCheckResult, UpdateUrgency};
pub use version::{compare_versions, is_newer, VersionOrdering};
