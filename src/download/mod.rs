//! Streamed package downloads with progress reporting
//!
//! A [`Downloader`] runs at most one session at a time. Each session is owned
//! by a spawned task that streams the body into `<destination>.part` in fixed
//! size chunks, reports progress when the rounded percentage changes and
//! renames the file into place on success.
//!
//! Starting a new session while one is active cancels the old one and waits
//! for it to finish before the new transfer begins.

mod downloader;
mod error;
mod progress;
mod session;


pub use downloader::{
    CompletedDownload, DownloadEvent, DownloadHandle, DownloadOutcome, DownloadRequest,
    Downloader, DownloaderConfig, DEFAULT_CHUNK_SIZE,
};
pub use error::{DownloadError, Result};
pub use progress::{percent_of, ProgressEvent, ProgressTracker};
pub use session::{DownloadSession, DownloadStatus};
