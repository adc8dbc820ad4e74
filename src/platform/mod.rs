//! OS handoff for URLs and downloaded packages
//!
//! The bridge never installs anything itself: it hands a URL or a package
//! file to a [`PlatformLauncher`] and reports whether the OS accepted it.

mod launcher;

pub use launcher::{platform_version, LaunchError, LogOnlyLauncher, PlatformLauncher, SystemLauncher};
