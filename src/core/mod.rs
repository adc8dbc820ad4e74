//! Core module
//!
//! Error taxonomy, shared enums and small helpers used by every other module.

pub mod error;
pub mod types;
pub mod utils;

pub use error::{BridgeError, CommandError, Result};
pub use types::{PackageHandoff, UpdateMode, UpdaterKind};
