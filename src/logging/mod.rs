//! Logging system
//!
//! Builds one `tracing_subscriber` registry from a [`LoggingConfig`]: an
//! `EnvFilter` (overridden by `RUST_LOG` when set), an optional console layer
//! and an optional non-blocking rolling file layer. Both layers honour the
//! text/JSON format switch.

mod config;


pub use config::{LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logging system errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    Init(String),

    #[error("Failed to create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid log directive '{0}'")]
    InvalidDirective(String),
}

/// Result type for logging operations
pub type LoggingResult<T> = Result<T, LoggingError>;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Installed global subscriber; keep alive for the life of the process
///
/// Dropping it flushes and stops the file writer.
pub struct LoggingSystem {
    config: LoggingConfig,
    _file_guard: Option<WorkerGuard>,
}

impl LoggingSystem {
    /// Install the global subscriber described by `config`
    pub fn init(config: LoggingConfig) -> LoggingResult<Self> {
        let filter = Self::build_env_filter(&config)?;

        let console = match config.output {
            LogOutput::Console | LogOutput::Both => Some(Self::console_layer(&config)),
            LogOutput::File => None,
        };

        let (file, file_guard) = if config.writes_to_file() {
            let dir = Self::file_directory(&config);
            std::fs::create_dir_all(&dir).map_err(|source| LoggingError::Directory {
                path: dir.clone(),
                source,
            })?;
            let (layer, guard) = Self::file_layer(&config, &dir);
            (Some(layer), Some(guard))
        } else {
            (None, None)
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file)
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;

        tracing::debug!(
            level = %config.level,
            output = ?config.output,
            format = ?config.format,
            "Logging initialized"
        );

        Ok(Self {
            config,
            _file_guard: file_guard,
        })
    }

    /// Global level plus per-module directives
    pub(crate) fn build_env_filter(config: &LoggingConfig) -> LoggingResult<EnvFilter> {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

        for (module, level) in &config.module_levels {
            let directive = format!("{}={}", module, level);
            let parsed = directive
                .parse()
                .map_err(|_| LoggingError::InvalidDirective(directive.clone()))?;
            filter = filter.add_directive(parsed);
        }

        Ok(filter)
    }

    fn file_directory(config: &LoggingConfig) -> PathBuf {
        config
            .log_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    fn console_layer<S>(config: &LoggingConfig) -> BoxedLayer<S>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_target(config.include_target)
            .with_thread_ids(config.include_thread_id)
            .with_file(config.include_file_info)
            .with_line_number(config.include_file_info);

        match config.format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Text => layer.boxed(),
        }
    }

    fn file_layer<S>(config: &LoggingConfig, dir: &Path) -> (BoxedLayer<S>, WorkerGuard)
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        let rotation = match config.rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        };
        let appender = RollingFileAppender::new(rotation, dir, &config.file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(config.include_target)
            .with_thread_ids(config.include_thread_id)
            .with_file(config.include_file_info)
            .with_line_number(config.include_file_info);

        let layer = match config.format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Text => layer.boxed(),
        };
        (layer, guard)
    }

    pub fn log_directory(&self) -> Option<&PathBuf> {
        self.config.log_directory.as_ref()
    }

    pub fn log_level(&self) -> LogLevel {
        self.config.level
    }
}
