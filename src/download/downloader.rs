//! Download task and handle

use futures::TryStreamExt;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::{DownloadError, Result};
use super::progress::{ProgressEvent, ProgressTracker};
use super::session::DownloadSession;
use crate::core::utils::{format_file_size, partial_path};

/// Default chunk size for streamed downloads (8 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Configuration for the downloader
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Bytes per chunk write
    pub chunk_size: usize,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Report progress after every chunk instead of only on percent changes
    pub emit_every_chunk: bool,
    /// User agent sent with requests
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
            emit_every_chunk: false,
            user_agent: concat!("app-update-bridge/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// What to download and where to put it
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub destination: PathBuf,
    /// Hex encoded SHA-256 the body must match
    pub expected_sha256: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            expected_sha256: None,
        }
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.expected_sha256 = Some(sha256.into());
        self
    }
}

/// Summary of a finished transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedDownload {
    pub path: PathBuf,
    pub bytes: u64,
    pub chunks: u64,
}

/// Event emitted by a running session
///
/// Every session ends with exactly one of `Completed`, `Failed` or
/// `Cancelled`, and nothing follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Progress(ProgressEvent),
    Completed { path: PathBuf, bytes: u64, chunks: u64 },
    Failed { reason: String },
    Cancelled,
}

impl DownloadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DownloadEvent::Progress(_))
    }
}

/// Terminal result of a session
#[derive(Debug)]
pub enum DownloadOutcome {
    Completed(CompletedDownload),
    Failed(DownloadError),
    Cancelled,
}

impl DownloadOutcome {
    pub fn into_result(self) -> Result<CompletedDownload> {
        match self {
            DownloadOutcome::Completed(done) => Ok(done),
            DownloadOutcome::Failed(err) => Err(err),
            DownloadOutcome::Cancelled => Err(DownloadError::Cancelled),
        }
    }
}

/// Caller side of a running session
pub struct DownloadHandle {
    id: Uuid,
    events: mpsc::UnboundedReceiver<DownloadEvent>,
    token: CancellationToken,
    task: JoinHandle<DownloadOutcome>,
}

impl DownloadHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event, or `None` once the session has ended and all events were read
    pub async fn next_event(&mut self) -> Option<DownloadEvent> {
        self.events.recv().await
    }

    /// Request cancellation; the session ends with `Cancelled` at the next chunk boundary
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for the session to end
    pub async fn wait(self) -> DownloadOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => DownloadOutcome::Failed(DownloadError::TaskAborted(e.to_string())),
        }
    }

    /// Drain events into `on_progress` until the session ends, then return its outcome
    pub async fn wait_with_progress<F>(mut self, mut on_progress: F) -> DownloadOutcome
    where
        F: FnMut(ProgressEvent),
    {
        while let Some(event) = self.events.recv().await {
            if let DownloadEvent::Progress(progress) = event {
                on_progress(progress);
            }
        }
        self.wait().await
    }
}

struct ActiveSession {
    id: Uuid,
    token: CancellationToken,
    done: watch::Receiver<()>,
}

impl ActiveSession {
    fn is_finished(&self) -> bool {
        self.done.has_changed().is_err()
    }

    async fn finished(mut self) {
        // The sender is dropped when the task ends
        while self.done.changed().await.is_ok() {}
    }
}

/// Streams URLs to disk, one session at a time
pub struct Downloader {
    client: reqwest::Client,
    config: Arc<DownloaderConfig>,
    active: Mutex<Option<ActiveSession>>,
}

impl Downloader {
    /// Create a downloader with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(DownloaderConfig::default())
    }

    pub fn with_config(config: DownloaderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(DownloaderConfig {
                chunk_size: config.chunk_size.max(1),
                ..config
            }),
            active: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Start a session, cancelling and awaiting any session still running
    pub async fn start(&self, request: DownloadRequest) -> DownloadHandle {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            if !previous.is_finished() {
                tracing::info!("Cancelling download {} in favour of {}", previous.id, request.url);
                previous.token.cancel();
                previous.finished().await;
            }
        }

        let session = DownloadSession::new(request.url.clone(), request.destination.clone());
        let id = session.id;
        let token = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = watch::channel(());

        let task = tokio::spawn(run_session(
            self.client.clone(),
            Arc::clone(&self.config),
            request,
            session,
            token.clone(),
            events_tx,
            done_tx,
        ));

        *active = Some(ActiveSession {
            id,
            token: token.clone(),
            done: done_rx,
        });

        DownloadHandle {
            id,
            events: events_rx,
            token,
            task,
        }
    }

    /// Cancel the running session; returns whether one was running
    pub async fn cancel_active(&self) -> bool {
        let active = self.active.lock().await;
        match active.as_ref() {
            Some(session) if !session.is_finished() && !session.token.is_cancelled() => {
                tracing::info!("Cancelling download {}", session.id);
                session.token.cancel();
                true
            }
            _ => false,
        }
    }

    pub async fn is_active(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|session| !session.is_finished())
            .unwrap_or(false)
    }

    /// Run a session to completion, ignoring progress
    pub async fn download(&self, request: DownloadRequest) -> Result<CompletedDownload> {
        self.start(request).await.wait().await.into_result()
    }
}

async fn run_session(
    client: reqwest::Client,
    config: Arc<DownloaderConfig>,
    request: DownloadRequest,
    mut session: DownloadSession,
    token: CancellationToken,
    events: mpsc::UnboundedSender<DownloadEvent>,
    _done: watch::Sender<()>,
) -> DownloadOutcome {
    tracing::info!("Downloading {} to {}", request.url, request.destination.display());

    let part = partial_path(&request.destination);
    let result = transfer(&client, &config, &request, &part, &mut session, &token, &events).await;

    let (event, outcome) = match result {
        Ok(()) => match session.complete() {
            Ok(()) => {
                tracing::info!(
                    "Download {} complete: {} in {} chunks",
                    session.id,
                    format_file_size(session.bytes_transferred),
                    session.chunks_written
                );
                let done = CompletedDownload {
                    path: request.destination.clone(),
                    bytes: session.bytes_transferred,
                    chunks: session.chunks_written,
                };
                (
                    DownloadEvent::Completed {
                        path: done.path.clone(),
                        bytes: done.bytes,
                        chunks: done.chunks,
                    },
                    DownloadOutcome::Completed(done),
                )
            }
            Err(e) => failed(&mut session, e),
        },
        Err(DownloadError::Cancelled) => {
            remove_partial(&part).await;
            if let Err(e) = session.cancel() {
                tracing::warn!("Session {} cancelled from unexpected state: {}", session.id, e);
            }
            tracing::info!("Download {} cancelled", session.id);
            (DownloadEvent::Cancelled, DownloadOutcome::Cancelled)
        }
        Err(e) => {
            remove_partial(&part).await;
            failed(&mut session, e)
        }
    };

    let _ = events.send(event);
    outcome
}

fn failed(session: &mut DownloadSession, err: DownloadError) -> (DownloadEvent, DownloadOutcome) {
    let reason = err.to_string();
    tracing::warn!("Download {} failed: {}", session.id, reason);
    if let Err(e) = session.fail(reason.clone()) {
        tracing::warn!("Session {} failed from unexpected state: {}", session.id, e);
    }
    (DownloadEvent::Failed { reason }, DownloadOutcome::Failed(err))
}

async fn remove_partial(part: &Path) {
    match tokio::fs::remove_file(part).await {
        Ok(()) => tracing::debug!("Removed partial file {}", part.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove partial file {}: {}", part.display(), e),
    }
}

async fn transfer(
    client: &reqwest::Client,
    config: &DownloaderConfig,
    request: &DownloadRequest,
    part: &Path,
    session: &mut DownloadSession,
    token: &CancellationToken,
    events: &mpsc::UnboundedSender<DownloadEvent>,
) -> Result<()> {
    let response = tokio::select! {
        biased;
        _ = token.cancelled() => return Err(DownloadError::Cancelled),
        response = client.get(&request.url).send() => response?,
    };

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::HttpStatus {
            status: status.as_u16(),
        });
    }

    let total = response.content_length().filter(|len| *len > 0);
    session.begin(total)?;

    if let Some(parent) = request.destination.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let mut file = File::create(part).await?;

    let stream = response
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
    let mut reader = StreamReader::new(Box::pin(stream));
    let mut buffer = vec![0u8; config.chunk_size];
    let mut hasher = request.expected_sha256.as_ref().map(|_| Sha256::new());
    let mut tracker = ProgressTracker::new(total, config.emit_every_chunk);

    loop {
        let filled = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(DownloadError::Cancelled),
            filled = fill_chunk(&mut reader, &mut buffer) => filled.map_err(DownloadError::Stream)?,
        };
        if filled == 0 {
            break;
        }

        file.write_all(&buffer[..filled]).await?;
        if let Some(hasher) = hasher.as_mut() {
            hasher.update(&buffer[..filled]);
        }
        session.record_chunk(filled as u64)?;

        if token.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        if let Some(progress) = tracker.observe(session.bytes_transferred) {
            let _ = events.send(DownloadEvent::Progress(progress));
        }
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    if let (Some(expected), Some(hasher)) = (request.expected_sha256.as_ref(), hasher) {
        let actual = hex::encode(hasher.finalize());
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(DownloadError::ChecksumMismatch {
                expected: expected.clone(),
                actual,
            });
        }
    }

    tokio::fs::rename(part, &request.destination).await?;
    Ok(())
}

/// Read until `buf` is full or the stream ends
async fn fill_chunk<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
