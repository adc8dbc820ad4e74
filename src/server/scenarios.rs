//! Canned update scenarios served by the mock server

use std::fmt;
use std::str::FromStr;

use crate::update::UpdateDescriptor;

/// Scenario served by `/api/version` without a path segment
pub const DEFAULT_SCENARIO: Scenario = Scenario::OptionalUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    NoUpdate,
    OptionalUpdate,
    ForceUpdate,
    HighPriority,
}

impl Scenario {
    /// Every scenario, in listing order
    pub const ALL: [Scenario; 4] = [
        Scenario::NoUpdate,
        Scenario::OptionalUpdate,
        Scenario::ForceUpdate,
        Scenario::HighPriority,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::NoUpdate => "no-update",
            Scenario::OptionalUpdate => "optional-update",
            Scenario::ForceUpdate => "force-update",
            Scenario::HighPriority => "high-priority",
        }
    }

    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|s| s.name().to_string()).collect()
    }

    /// Package file offered by this scenario, if any
    pub fn package_name(&self) -> Option<String> {
        match self {
            Scenario::NoUpdate => None,
            other => Some(format!("app-v{}.apk", other.version())),
        }
    }

    fn version(&self) -> &'static str {
        match self {
            Scenario::NoUpdate => "1.0.0",
            Scenario::OptionalUpdate => "1.1.0",
            Scenario::ForceUpdate => "1.2.0",
            Scenario::HighPriority => "1.3.0",
        }
    }

    /// Human readable summary used by the index page
    pub fn summary(&self) -> &'static str {
        match self {
            Scenario::NoUpdate => "You are running the latest version",
            Scenario::OptionalUpdate => "Bug fixes and performance improvements",
            Scenario::ForceUpdate => "Critical security update - Update required to continue",
            Scenario::HighPriority => "Important feature update with new capabilities",
        }
    }

    /// Descriptor for this scenario with download links under `base_url`
    pub fn descriptor(&self, base_url: &str) -> UpdateDescriptor {
        let base_url = base_url.trim_end_matches('/');
        let (build, priority, force_update, update_available) = match self {
            Scenario::NoUpdate => (1, 0, false, false),
            Scenario::OptionalUpdate => (11, 2, false, true),
            Scenario::ForceUpdate => (12, 5, true, true),
            Scenario::HighPriority => (13, 4, false, true),
        };

        let mut descriptor = UpdateDescriptor {
            version: self.version().to_string(),
            build: Some(build),
            priority: Some(priority),
            force_update: Some(force_update),
            update_available: Some(update_available),
            ..Default::default()
        };

        match self.package_name() {
            Some(package) => {
                descriptor.download_url = Some(format!("{}/downloads/{}", base_url, package));
                descriptor.release_notes = Some(self.summary().to_string());
            }
            None => descriptor.message = Some(self.summary().to_string()),
        }
        descriptor
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| format!("Unknown scenario: {}", s))
    }
}
