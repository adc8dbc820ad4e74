//! Mock update server implementation
//!
//! Serves canned update descriptors and lazily generated packages so the
//! check, download and install flows can run end to end without a real
//! release backend.

use std::collections::BTreeMap;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use dashmap::DashMap;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::ServerError;
use super::routes::{
    default_version, index, scenario_info, scenario_version, serve_download, status,
};

/// Default port for the mock server
pub const DEFAULT_MOCK_SERVER_PORT: u16 = 3000;

/// Default size of generated packages (1 MiB)
pub const DEFAULT_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Pattern repeated to fill generated packages
pub const PAYLOAD_PATTERN: &[u8] = b"Mock APK Content";

/// Build a payload of `size` bytes by repeating [`PAYLOAD_PATTERN`]
pub fn mock_payload(size: usize) -> Vec<u8> {
    PAYLOAD_PATTERN.iter().copied().cycle().take(size).collect()
}

/// Mock server configuration
#[derive(Clone, Debug)]
pub struct MockServerConfig {
    /// Address to bind; port 0 picks a free port
    pub bind_addr: SocketAddr,
    /// Directory holding served packages
    pub downloads_dir: PathBuf,
    /// Size of packages generated on first request
    pub payload_size: usize,
    /// Pause before each body chunk, to make progress observable
    pub chunk_delay: Option<Duration>,
    /// Base URL advertised in descriptors (defaults to the bound address)
    pub public_base_url: Option<String>,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_MOCK_SERVER_PORT)),
            downloads_dir: std::env::temp_dir().join("mock-update-server").join("downloads"),
            payload_size: DEFAULT_PAYLOAD_SIZE,
            chunk_delay: None,
            public_base_url: None,
        }
    }
}

impl MockServerConfig {
    /// Create a configuration bound to localhost on `port`
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
            ..Default::default()
        }
    }

    pub fn with_downloads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.downloads_dir = dir.into();
        self
    }

    pub fn with_payload_size(mut self, size: usize) -> Self {
        self.payload_size = size;
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    /// Base URL clients should use for a server bound to `addr`
    pub fn base_url_for(&self, addr: SocketAddr) -> String {
        if let Some(url) = &self.public_base_url {
            return url.trim_end_matches('/').to_string();
        }
        if addr.ip().is_unspecified() {
            format!("http://localhost:{}", addr.port())
        } else {
            format!("http://{}", addr)
        }
    }
}

/// Shared state for the mock server handlers
#[derive(Clone)]
pub struct ServerState {
    config: Arc<MockServerConfig>,
    base_url: String,
    port: u16,
    download_counts: Arc<DashMap<String, u64>>,
    generation: Arc<tokio::sync::Mutex<()>>,
}

impl ServerState {
    pub fn new(config: MockServerConfig, base_url: impl Into<String>, port: u16) -> Self {
        Self {
            config: Arc::new(config),
            base_url: base_url.into(),
            port,
            download_counts: Arc::new(DashMap::new()),
            generation: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn config(&self) -> &MockServerConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Count a served download
    pub fn record_download(&self, filename: &str) {
        *self.download_counts.entry(filename.to_string()).or_insert(0) += 1;
    }

    /// Number of times each file was served
    pub fn download_counts(&self) -> BTreeMap<String, u64> {
        self.download_counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Path of `filename`, generating a mock package there if absent
    pub async fn ensure_payload(&self, filename: &str) -> Result<PathBuf, ServerError> {
        let path = self.config.downloads_dir.join(filename);
        let _guard = self.generation.lock().await;

        if tokio::fs::try_exists(&path).await? {
            return Ok(path);
        }

        tokio::fs::create_dir_all(&self.config.downloads_dir).await?;
        let staging = staging_path(&path);
        tokio::fs::write(&staging, mock_payload(self.config.payload_size)).await?;
        tokio::fs::rename(&staging, &path).await?;

        tracing::info!(
            "Created mock package {} ({} bytes)",
            path.display(),
            self.config.payload_size
        );
        Ok(path)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Build the router for `state`
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .route("/api/version", get(default_version))
        .route("/api/version/:scenario", get(scenario_version))
        .route("/downloads/:filename", get(serve_download))
        .route("/test/:scenario", get(scenario_info))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Mock update server bound to a listener
pub struct MockUpdateServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: ServerState,
}

impl MockUpdateServer {
    /// Bind the configured address
    pub async fn bind(config: MockServerConfig) -> Result<Self, ServerError> {
        let addr = config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::BindFailed { addr, source })?;
        let local_addr = listener.local_addr()?;
        let base_url = config.base_url_for(local_addr);

        Ok(Self {
            listener,
            local_addr,
            state: ServerState::new(config, base_url, local_addr.port()),
        })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn base_url(&self) -> &str {
        self.state.base_url()
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve until the process exits
    pub async fn serve(self) -> Result<(), ServerError> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        tracing::info!("Mock update server listening on {}", self.state.base_url());

        axum::serve(self.listener, router)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| ServerError::Internal {
                reason: e.to_string(),
            })?;

        tracing::info!("Mock update server stopped");
        Ok(())
    }

    /// Serve in a background task
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<(), ServerError>> {
        tokio::spawn(async move { self.serve().await })
    }
}
