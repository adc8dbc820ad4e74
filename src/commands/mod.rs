//! Host command surface
//!
//! Commands exposed to the host application:
//! - Update checks (checkForUpdate, isUpdateAvailable)
//! - Store flows (startFlexibleUpdate, startImmediateUpdate, completeFlexibleUpdate)
//! - Package delivery (downloadAndInstallApk, cancelDownload)
//! - Platform info (getPlatformVersion)

mod bridge;
mod dto;


pub use bridge::{UpdateBridge, METHODS};
pub use dto::{CheckForUpdateArgs, DownloadArgs, PackageDelivery};
