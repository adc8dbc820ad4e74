//! Version comparison
//!
//! Dot-separated numeric version strings compared component by component.
//! Missing trailing components count as zero and non-numeric components parse
//! as zero, so malformed input never fails.

mod compare;

#[cfg(test)]
mod tests;

pub use compare::{compare_versions, is_newer, VersionOrdering, VersionString};
