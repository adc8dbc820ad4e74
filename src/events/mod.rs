//! Host notification events
//!
//! Events are fire-and-forget: the bridge pushes them into an [`EventSink`]
//! injected at construction and never waits for an acknowledgement. A
//! [`ChannelSink`] hands them to an unbounded channel so the host can drain
//! them on its own task.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// Outcome of a store-managed update flow as reported by the host
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowResult {
    Success,
    Cancelled,
    Failed,
}

impl std::fmt::Display for FlowResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowResult::Success => write!(f, "success"),
            FlowResult::Cancelled => write!(f, "cancelled"),
            FlowResult::Failed => write!(f, "failed"),
        }
    }
}

/// Asynchronous event delivered to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    /// Download progress, 0-100
    Progress { progress: u8 },
    /// A store-managed update finished downloading
    Downloaded,
    /// A store-managed update was installed
    Installed,
    /// A store-managed update failed
    Failed { error: String },
    /// Result of an update flow started by the host
    Result { result: FlowResult },
}

impl UpdateEvent {
    /// Host method name for this event
    pub fn method(&self) -> &'static str {
        match self {
            UpdateEvent::Progress { .. } => "onUpdateProgress",
            UpdateEvent::Downloaded => "onUpdateDownloaded",
            UpdateEvent::Installed => "onUpdateInstalled",
            UpdateEvent::Failed { .. } => "onUpdateFailed",
            UpdateEvent::Result { .. } => "onUpdateResult",
        }
    }

    /// Event arguments as sent to the host, `None` for argument-less events
    pub fn arguments(&self) -> Option<Value> {
        match self {
            UpdateEvent::Progress { progress } => Some(json!({ "progress": progress })),
            UpdateEvent::Downloaded | UpdateEvent::Installed => None,
            UpdateEvent::Failed { error } => Some(json!({ "error": error })),
            UpdateEvent::Result { result } => Some(json!({ "result": result })),
        }
    }
}

/// Destination for host notifications
pub trait EventSink: Send + Sync {
    /// Deliver an event; must not block
    fn emit(&self, event: UpdateEvent);
}

/// Sink that forwards events into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<UpdateEvent>,
}

impl ChannelSink {
    /// Create a sink together with the receiver the host drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UpdateEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: UpdateEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Event receiver dropped, discarding event");
        }
    }
}

/// Sink that only logs events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: UpdateEvent) {
        tracing::info!(
            event = event.method(),
            arguments = ?event.arguments(),
            "Update event"
        );
    }
}
