//! Fakes shared by unit tests across modules

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::types::UpdateMode;
use crate::platform::{LaunchError, PlatformLauncher};
use crate::update::{
    AppUpdateInfo, AppUpdateService, InstallState, InstallStateListener, ListenerId,
    ServiceError, UpdateAvailability,
};

/// Bind a router to 127.0.0.1:0 and return its base URL
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Launcher that rejects every handoff
#[derive(Debug, Default)]
pub struct FailingLauncher;

impl PlatformLauncher for FailingLauncher {
    fn open_url(&self, url: &str) -> Result<(), LaunchError> {
        Err(LaunchError::Rejected(format!("no handler for {}", url)))
    }

    fn install_package(&self, path: &Path) -> Result<(), LaunchError> {
        Err(LaunchError::Rejected(format!("installer refused {}", path.display())))
    }
}

/// Scriptable in-app update service
pub struct FakeAppUpdateService {
    pub info: Mutex<Result<AppUpdateInfo, ServiceError>>,
    pub start_result: Mutex<Result<(), ServiceError>>,
    pub complete_result: Mutex<Result<(), ServiceError>>,
    pub started: Mutex<Vec<UpdateMode>>,
    pub completed: AtomicUsize,
    listeners: Mutex<HashMap<ListenerId, InstallStateListener>>,
    next_listener: AtomicU64,
}

impl FakeAppUpdateService {
    pub fn with_info(info: AppUpdateInfo) -> Self {
        Self {
            info: Mutex::new(Ok(info)),
            start_result: Mutex::new(Ok(())),
            complete_result: Mutex::new(Ok(())),
            started: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
            listeners: Mutex::new(HashMap::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    /// An update with both modes allowed
    pub fn available() -> Self {
        Self::with_info(AppUpdateInfo {
            availability: UpdateAvailability::Available,
            available_version_code: 42,
            immediate_allowed: true,
            flexible_allowed: true,
            update_priority: 2,
        })
    }

    pub fn not_available() -> Self {
        Self::with_info(AppUpdateInfo {
            availability: UpdateAvailability::NotAvailable,
            ..Default::default()
        })
    }

    pub fn fail_info(&self, message: &str) {
        *self.info.lock() = Err(ServiceError::Unavailable(message.to_string()));
    }

    /// Deliver an install state to every registered listener
    pub fn push_state(&self, state: InstallState) {
        let listeners: Vec<_> = self.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener(state);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

#[async_trait]
impl AppUpdateService for FakeAppUpdateService {
    async fn app_update_info(&self) -> Result<AppUpdateInfo, ServiceError> {
        self.info.lock().clone()
    }

    async fn start_update_flow(&self, _info: &AppUpdateInfo, mode: UpdateMode) -> Result<(), ServiceError> {
        self.start_result.lock().clone()?;
        self.started.lock().push(mode);
        Ok(())
    }

    async fn complete_update(&self) -> Result<(), ServiceError> {
        self.complete_result.lock().clone()?;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn register_listener(&self, listener: InstallStateListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().insert(id, listener);
        id
    }

    fn unregister_listener(&self, id: ListenerId) {
        self.listeners.lock().remove(&id);
    }
}

pub fn shared(service: FakeAppUpdateService) -> Arc<FakeAppUpdateService> {
    Arc::new(service)
}

/// Start the mock update server on 127.0.0.1:0 and return its base URL
pub async fn spawn_mock_server(config: crate::server::MockServerConfig) -> String {
    let server = crate::server::MockUpdateServer::bind(config).await.unwrap();
    let base_url = server.base_url().to_string();
    let _ = server.spawn();
    base_url
}
