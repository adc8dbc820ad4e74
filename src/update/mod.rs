//! Update decisions and platform update flows
//!
//! This module provides:
//! - The update check model and the pure decision engine
//! - Direct-URL checks against a remote update descriptor
//! - The [`PlatformUpdater`] capability with store and direct-URL variants

pub mod app_store;
pub mod direct;
pub mod engine;
pub mod model;
pub mod play_service;
pub mod play_store;
pub mod updater;

#[cfg(test)]
mod tests;

pub use app_store::{store_page_url, AppStoreUpdater, DEFAULT_LOOKUP_URL};
pub use direct::{DirectUpdateChecker, DirectUrlUpdater};
pub use engine::{decide_direct, decide_store};
pub use model::{
    StoreReport, UpdateCheckResult, UpdateDescriptor, UpdateFlowStart, UpdateUrgency,
    HIGH_PRIORITY_THRESHOLD, MANDATORY_PRIORITY_THRESHOLD,
};
pub use play_service::{
    AppUpdateInfo, AppUpdateService, InstallState, InstallStateListener, InstallStatus,
    ListenerId, ServiceError, UpdateAvailability,
};
pub use play_store::{install_state_event, ActivityScope, FlowOutcome, PlayStoreUpdater};
pub use updater::PlatformUpdater;
