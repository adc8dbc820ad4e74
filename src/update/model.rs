//! Update check data model
//!
//! [`UpdateDescriptor`] is the JSON document a direct update URL serves (the
//! mock server produces the same shape). [`UpdateCheckResult`] is what every
//! check hands back to the host, serialized camelCase.

use serde::{Deserialize, Serialize};

use crate::core::types::UpdateMode;

/// Priority at or above which an update is treated as high priority
pub const HIGH_PRIORITY_THRESHOLD: i32 = 4;

/// Priority at or above which an update is mandatory
pub const MANDATORY_PRIORITY_THRESHOLD: i32 = 5;

/// How strongly the host should push an available update
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UpdateUrgency {
    /// Nothing to install
    None,
    Optional,
    HighPriority,
    /// The app should not continue without updating
    Mandatory,
}

impl std::fmt::Display for UpdateUrgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateUrgency::None => write!(f, "none"),
            UpdateUrgency::Optional => write!(f, "optional"),
            UpdateUrgency::HighPriority => write!(f, "high_priority"),
            UpdateUrgency::Mandatory => write!(f, "mandatory"),
        }
    }
}

/// Remote update document served by a direct update URL
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDescriptor {
    /// Latest available version, dot separated
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_update: Option<bool>,
    /// Advisory only; availability is always recomputed from `version`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Hex SHA-256 of the package behind `download_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Availability as reported by a store service
///
/// The store is authoritative: `update_available` is never recomputed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreReport {
    pub update_available: bool,
    pub remote_version: String,
    pub priority: Option<i32>,
    pub immediate_allowed: Option<bool>,
    pub flexible_allowed: Option<bool>,
    pub store_url: Option<String>,
    pub release_notes: Option<String>,
}

/// Result of an update check
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheckResult {
    pub update_available: bool,
    pub current_version: String,
    pub remote_version: String,
    /// Whether the update comes from a direct URL rather than a store
    pub direct_update: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immediate_update_allowed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flexible_update_allowed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl UpdateCheckResult {
    /// Urgency derived from availability, force flag and priority
    pub fn urgency(&self) -> UpdateUrgency {
        if !self.update_available {
            return UpdateUrgency::None;
        }
        let priority = self.priority.unwrap_or(0);
        if self.force_update.unwrap_or(false) || priority >= MANDATORY_PRIORITY_THRESHOLD {
            UpdateUrgency::Mandatory
        } else if priority >= HIGH_PRIORITY_THRESHOLD {
            UpdateUrgency::HighPriority
        } else {
            UpdateUrgency::Optional
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.urgency() == UpdateUrgency::Mandatory
    }
}

/// How an update flow was started
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UpdateFlowStart {
    /// The platform update flow is running in the given mode
    Started { mode: UpdateMode },
    /// The store page was opened instead of an in-app flow
    RedirectedToStore { url: String },
}
