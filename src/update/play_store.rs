//! Store-managed updates through the vendor in-app update service

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::engine::decide_store;
use super::model::{StoreReport, UpdateCheckResult, UpdateFlowStart};
use super::play_service::{
    AppUpdateService, InstallState, InstallStatus, ListenerId, UpdateAvailability,
};
use super::updater::PlatformUpdater;
use crate::core::error::{BridgeError, Result};
use crate::core::types::{PackageHandoff, UpdateMode, UpdaterKind};
use crate::download::percent_of;
use crate::events::{EventSink, FlowResult, UpdateEvent};
use crate::platform::PlatformLauncher;

/// Result code the host activity delivered for the update flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    Ok,
    Canceled,
    /// Any other activity result code
    Other(i32),
}

impl From<FlowOutcome> for FlowResult {
    fn from(outcome: FlowOutcome) -> Self {
        match outcome {
            FlowOutcome::Ok => FlowResult::Success,
            FlowOutcome::Canceled => FlowResult::Cancelled,
            FlowOutcome::Other(_) => FlowResult::Failed,
        }
    }
}

/// Keeps the host activity attached while alive
///
/// Returned by [`PlayStoreUpdater::attach_activity`]. Update flows can only be
/// started while at least one scope exists.
#[must_use = "the activity detaches when the scope is dropped"]
#[derive(Debug)]
pub struct ActivityScope {
    attached: Arc<AtomicUsize>,
}

impl Drop for ActivityScope {
    fn drop(&mut self) {
        self.attached.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!("Host activity detached");
    }
}

/// Install-state listener registration; unregisters on drop
struct ListenerRegistration {
    service: Arc<dyn AppUpdateService>,
    id: ListenerId,
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.service.unregister_listener(self.id);
        tracing::debug!("Unregistered install state listener {:?}", self.id);
    }
}

/// Map an install state onto the host event it produces, if any
pub fn install_state_event(state: &InstallState) -> Option<UpdateEvent> {
    match state.status {
        InstallStatus::Downloading => percent_of(
            state.bytes_downloaded,
            Some(state.total_bytes_to_download),
        )
        .map(|progress| UpdateEvent::Progress { progress }),
        InstallStatus::Downloaded => Some(UpdateEvent::Downloaded),
        InstallStatus::Installed => Some(UpdateEvent::Installed),
        InstallStatus::Failed => Some(UpdateEvent::Failed {
            error: "Installation failed".to_string(),
        }),
        _ => None,
    }
}

pub struct PlayStoreUpdater {
    service: Arc<dyn AppUpdateService>,
    sink: Arc<dyn EventSink>,
    launcher: Arc<dyn PlatformLauncher>,
    current_version: String,
    attached: Arc<AtomicUsize>,
    downloaded: Arc<AtomicBool>,
    listener: Mutex<Option<ListenerRegistration>>,
}

impl PlayStoreUpdater {
    pub fn new(
        service: Arc<dyn AppUpdateService>,
        sink: Arc<dyn EventSink>,
        launcher: Arc<dyn PlatformLauncher>,
        current_version: impl Into<String>,
    ) -> Self {
        Self {
            service,
            sink,
            launcher,
            current_version: current_version.into(),
            attached: Arc::new(AtomicUsize::new(0)),
            downloaded: Arc::new(AtomicBool::new(false)),
            listener: Mutex::new(None),
        }
    }

    /// Mark the host activity as attached for the lifetime of the returned scope
    pub fn attach_activity(&self) -> ActivityScope {
        self.attached.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Host activity attached");
        ActivityScope {
            attached: Arc::clone(&self.attached),
        }
    }

    pub fn has_activity(&self) -> bool {
        self.attached.load(Ordering::SeqCst) > 0
    }

    /// Whether a flexible update finished downloading and can be completed
    pub fn is_download_ready(&self) -> bool {
        self.downloaded.load(Ordering::SeqCst)
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Drop the install-state listener, if registered
    pub fn detach_listener(&self) {
        self.listener.lock().take();
    }

    /// Forward the host's activity result for the update flow
    pub fn report_flow_result(&self, outcome: FlowOutcome) {
        let result = FlowResult::from(outcome);
        tracing::info!("Update flow finished: {}", result);
        self.sink.emit(UpdateEvent::Result { result });
    }

    fn ensure_listener(&self) {
        let mut listener = self.listener.lock();
        if listener.is_some() {
            return;
        }

        let sink = Arc::clone(&self.sink);
        let downloaded = Arc::clone(&self.downloaded);
        let id = self.service.register_listener(Arc::new(move |state: InstallState| {
            match state.status {
                InstallStatus::Downloaded => downloaded.store(true, Ordering::SeqCst),
                InstallStatus::Installed | InstallStatus::Failed | InstallStatus::Canceled => {
                    downloaded.store(false, Ordering::SeqCst)
                }
                _ => {}
            }
            if let Some(event) = install_state_event(&state) {
                sink.emit(event);
            }
        }));

        tracing::debug!("Registered install state listener {:?}", id);
        *listener = Some(ListenerRegistration {
            service: Arc::clone(&self.service),
            id,
        });
    }
}

#[async_trait]
impl PlatformUpdater for PlayStoreUpdater {
    fn kind(&self) -> UpdaterKind {
        UpdaterKind::PlayStore
    }

    async fn check_for_update(&self) -> Result<UpdateCheckResult> {
        if !self.has_activity() {
            return Err(BridgeError::NoActivity);
        }

        let info = self
            .service
            .app_update_info()
            .await
            .map_err(|e| BridgeError::UpdateCheckFailed(e.to_string()))?;

        let report = StoreReport {
            update_available: info.availability == UpdateAvailability::Available,
            remote_version: info.available_version_code.to_string(),
            priority: Some(info.update_priority),
            immediate_allowed: Some(info.immediate_allowed),
            flexible_allowed: Some(info.flexible_allowed),
            ..Default::default()
        };
        Ok(decide_store(&self.current_version, &report))
    }

    async fn is_update_available(&self) -> Result<bool> {
        let info = self
            .service
            .app_update_info()
            .await
            .map_err(|e| BridgeError::CheckFailed(e.to_string()))?;
        Ok(info.availability == UpdateAvailability::Available)
    }

    async fn start_update(&self, mode: UpdateMode) -> Result<UpdateFlowStart> {
        if !self.has_activity() {
            return Err(BridgeError::NotAvailable(
                "Activity or update service not available".to_string(),
            ));
        }

        if mode == UpdateMode::Flexible {
            self.ensure_listener();
        }

        let info = self
            .service
            .app_update_info()
            .await
            .map_err(|e| BridgeError::UpdateFailed(e.to_string()))?;

        if info.availability != UpdateAvailability::Available || !info.is_mode_allowed(mode) {
            return Err(BridgeError::UpdateNotAvailable(format!(
                "{} update not available",
                mode
            )));
        }

        self.service
            .start_update_flow(&info, mode)
            .await
            .map_err(|e| BridgeError::UpdateFailed(e.to_string()))?;

        tracing::info!("Started {} update flow to version code {}", mode, info.available_version_code);
        Ok(UpdateFlowStart::Started { mode })
    }

    async fn complete_update(&self, _staged: Option<&Path>) -> Result<()> {
        if !self.is_download_ready() {
            return Err(BridgeError::NoDownload);
        }
        self.service
            .complete_update()
            .await
            .map_err(|e| BridgeError::CompleteUpdateFailed(e.to_string()))
    }

    fn package_handoff(&self) -> PackageHandoff {
        PackageHandoff::DownloadAndInstall
    }

    async fn install_package(&self, path: &Path) -> Result<()> {
        self.launcher.install_package(path)?;
        Ok(())
    }
}
