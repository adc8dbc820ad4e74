//! Version string comparison

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Result of comparing a remote version against a local one
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VersionOrdering {
    /// Remote is newer than local
    Newer,
    /// Both versions are equal after zero padding
    Same,
    /// Remote is older than local
    Older,
}

impl VersionOrdering {
    /// The ordering seen from the other side of the comparison
    pub fn reverse(self) -> Self {
        match self {
            VersionOrdering::Newer => VersionOrdering::Older,
            VersionOrdering::Same => VersionOrdering::Same,
            VersionOrdering::Older => VersionOrdering::Newer,
        }
    }
}

impl From<Ordering> for VersionOrdering {
    fn from(ord: Ordering) -> Self {
        match ord {
            Ordering::Greater => VersionOrdering::Newer,
            Ordering::Equal => VersionOrdering::Same,
            Ordering::Less => VersionOrdering::Older,
        }
    }
}

/// A dot-separated version string such as `1.2.10`
///
/// Components are kept as normalized digit strings rather than integers so
/// there is no bound on their magnitude.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionString(String);

impl VersionString {
    /// Wrap a raw version string
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw string as given
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized numeric components, most significant first
    ///
    /// Each component is the digit string with leading zeros stripped; zero is
    /// the empty string. Non-numeric components become zero.
    pub fn components(&self) -> Vec<&str> {
        self.0.trim().split('.').map(normalize_component).collect()
    }
}

impl std::fmt::Display for VersionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq for VersionString {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionString {}

impl PartialOrd for VersionString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionString {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.components();
        let right = other.components();

        for i in 0..left.len().max(right.len()) {
            let a = left.get(i).copied().unwrap_or("");
            let b = right.get(i).copied().unwrap_or("");
            match compare_component(a, b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

fn normalize_component(part: &str) -> &str {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return "";
    }
    part.trim_start_matches('0')
}

/// Compare two normalized digit strings numerically
fn compare_component(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compare a remote version against the locally installed one
pub fn compare_versions(remote: &str, local: &str) -> VersionOrdering {
    VersionString::from(remote).cmp(&VersionString::from(local)).into()
}

/// Returns true if `remote` is strictly newer than `local`
pub fn is_newer(remote: &str, local: &str) -> bool {
    compare_versions(remote, local) == VersionOrdering::Newer
}
