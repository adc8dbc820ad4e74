//! Progress computation

use serde::{Deserialize, Serialize};

/// Download progress as a whole percentage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 0..=100
    pub percent: u8,
}

/// Rounded percentage of `bytes` over `total`, clamped to 100
///
/// Returns `None` when the total length is unknown or zero, so callers never
/// report a percentage they cannot back up.
pub fn percent_of(bytes: u64, total: Option<u64>) -> Option<u8> {
    let total = total.filter(|t| *t > 0)? as u128;
    let scaled = (bytes as u128 * 100 + total / 2) / total;
    Some(scaled.min(100) as u8)
}

/// Decides which chunk writes produce a progress event
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: Option<u64>,
    last: Option<u8>,
    emit_every_chunk: bool,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>, emit_every_chunk: bool) -> Self {
        Self {
            total,
            last: None,
            emit_every_chunk,
        }
    }

    /// Record the running byte count after a chunk write
    pub fn observe(&mut self, bytes: u64) -> Option<ProgressEvent> {
        let percent = percent_of(bytes, self.total)?;
        if !self.emit_every_chunk && self.last == Some(percent) {
            return None;
        }
        self.last = Some(percent);
        Some(ProgressEvent { percent })
    }

    /// Last percentage reported, if any
    pub fn last_percent(&self) -> Option<u8> {
        self.last
    }
}
