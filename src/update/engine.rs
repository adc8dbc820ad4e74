//! Update decisions
//!
//! Pure functions turning a remote descriptor or a store report into an
//! [`UpdateCheckResult`].

use super::model::{StoreReport, UpdateCheckResult, UpdateDescriptor};
use crate::version::{compare_versions, VersionOrdering};

/// Decide from a direct-URL descriptor
///
/// Availability is recomputed from the versions; a descriptor claiming
/// `updateAvailable` for an older build is ignored.
pub fn decide_direct(current_version: &str, descriptor: &UpdateDescriptor) -> UpdateCheckResult {
    let ordering = compare_versions(&descriptor.version, current_version);
    if descriptor.update_available.is_some_and(|claimed| claimed != (ordering == VersionOrdering::Newer)) {
        tracing::debug!(
            "Descriptor availability flag disagrees with versions {} vs {}",
            descriptor.version,
            current_version
        );
    }

    UpdateCheckResult {
        update_available: ordering == VersionOrdering::Newer,
        current_version: current_version.trim().to_string(),
        remote_version: descriptor.version.trim().to_string(),
        direct_update: true,
        download_url: descriptor.download_url.clone(),
        priority: descriptor.priority,
        force_update: descriptor.force_update,
        release_notes: descriptor.release_notes.clone(),
        sha256: descriptor.sha256.clone(),
        ..Default::default()
    }
}

/// Decide from a store report, trusting its availability flag
pub fn decide_store(current_version: &str, report: &StoreReport) -> UpdateCheckResult {
    UpdateCheckResult {
        update_available: report.update_available,
        current_version: current_version.to_string(),
        remote_version: report.remote_version.clone(),
        direct_update: false,
        priority: report.priority,
        immediate_update_allowed: report.immediate_allowed,
        flexible_update_allowed: report.flexible_allowed,
        store_url: report.store_url.clone(),
        release_notes: report.release_notes.clone(),
        ..Default::default()
    }
}
