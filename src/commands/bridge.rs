//! Update bridge command surface
//!
//! [`UpdateBridge`] is the single entry point a host talks to. Each command
//! is available as a typed async method and through [`UpdateBridge::handle`],
//! which dispatches on the host's method name and JSON arguments.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use super::dto::{CheckForUpdateArgs, DownloadArgs, PackageDelivery};
use crate::config::BridgeConfig;
use crate::core::error::{BridgeError, CommandError, Result};
use crate::core::types::{PackageHandoff, UpdateMode, UpdaterKind};
use crate::download::{DownloadRequest, Downloader};
use crate::events::{EventSink, UpdateEvent};
use crate::platform::{platform_version, PlatformLauncher};
use crate::update::{
    ActivityScope, AppStoreUpdater, AppUpdateService, DirectUpdateChecker, DirectUrlUpdater,
    FlowOutcome, PlatformUpdater, PlayStoreUpdater, UpdateCheckResult, UpdateFlowStart,
};

/// Host method names understood by [`UpdateBridge::handle`]
pub const METHODS: [&str; 8] = [
    "getPlatformVersion",
    "checkForUpdate",
    "startFlexibleUpdate",
    "startImmediateUpdate",
    "completeFlexibleUpdate",
    "downloadAndInstallApk",
    "isUpdateAvailable",
    "cancelDownload",
];

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn http_client(config: &BridgeConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.download.request_timeout())
        .connect_timeout(config.download.connect_timeout())
        .build()
        .map_err(|e| BridgeError::Config(format!("HTTP client: {}", e)))
}

pub struct UpdateBridge {
    config: BridgeConfig,
    updater: Arc<dyn PlatformUpdater>,
    play_store: Option<Arc<PlayStoreUpdater>>,
    checker: DirectUpdateChecker,
    downloader: Downloader,
    sink: Arc<dyn EventSink>,
    launcher: Arc<dyn PlatformLauncher>,
    staged: Mutex<Option<PathBuf>>,
}

impl UpdateBridge {
    /// Bridge for the direct-URL or app store updater
    pub fn new(
        config: BridgeConfig,
        sink: Arc<dyn EventSink>,
        launcher: Arc<dyn PlatformLauncher>,
    ) -> Result<Self> {
        Self::with_service(config, sink, launcher, None)
    }

    /// Bridge for any updater; the play store updater needs `service`
    pub fn with_service(
        config: BridgeConfig,
        sink: Arc<dyn EventSink>,
        launcher: Arc<dyn PlatformLauncher>,
        service: Option<Arc<dyn AppUpdateService>>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| BridgeError::Config(e.to_string()))?;

        let client = http_client(&config)?;
        let current_version = config.current_version.clone();
        let mut play_store = None;

        let updater: Arc<dyn PlatformUpdater> = match config.updater {
            UpdaterKind::PlayStore => {
                let service = service.ok_or_else(|| {
                    BridgeError::Config("play_store updater needs an app update service".to_string())
                })?;
                let updater = Arc::new(PlayStoreUpdater::new(
                    service,
                    Arc::clone(&sink),
                    Arc::clone(&launcher),
                    current_version,
                ));
                play_store = Some(Arc::clone(&updater));
                updater
            }
            UpdaterKind::AppStore => {
                let bundle_id = non_empty(config.bundle_id.clone()).ok_or_else(|| {
                    BridgeError::Config("app_store updater needs a bundle_id".to_string())
                })?;
                Arc::new(AppStoreUpdater::new(
                    client,
                    Arc::clone(&launcher),
                    config.app_store_lookup_url.clone(),
                    bundle_id,
                    current_version,
                ))
            }
            UpdaterKind::DirectUrl => Arc::new(DirectUrlUpdater::new(
                DirectUpdateChecker::with_client(client),
                Arc::clone(&launcher),
                non_empty(config.update_url.clone()),
                current_version,
            )),
        };

        let mut bridge = Self::with_updater(config, updater, sink, launcher)?;
        bridge.play_store = play_store;
        Ok(bridge)
    }

    /// Bridge around an already constructed updater
    pub fn with_updater(
        config: BridgeConfig,
        updater: Arc<dyn PlatformUpdater>,
        sink: Arc<dyn EventSink>,
        launcher: Arc<dyn PlatformLauncher>,
    ) -> Result<Self> {
        let checker = DirectUpdateChecker::new(
            config.download.request_timeout(),
            config.download.connect_timeout(),
        )?;
        let downloader = Downloader::with_config(config.download.downloader_config())
            .map_err(|e| BridgeError::Config(e.to_string()))?;

        tracing::info!(
            "Update bridge ready: updater={}, current_version={}",
            updater.kind(),
            config.current_version
        );

        Ok(Self {
            config,
            updater,
            play_store: None,
            checker,
            downloader,
            sink,
            launcher,
            staged: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn updater_kind(&self) -> UpdaterKind {
        self.updater.kind()
    }

    /// The play store updater, when that strategy is configured
    pub fn play_store(&self) -> Option<&PlayStoreUpdater> {
        self.play_store.as_deref()
    }

    /// Attach the host activity; `None` unless the play store updater is in use
    pub fn attach_activity(&self) -> Option<ActivityScope> {
        self.play_store.as_ref().map(|updater| updater.attach_activity())
    }

    /// Forward the host's update flow result; false when no store flow exists
    pub fn report_flow_result(&self, outcome: FlowOutcome) -> bool {
        match &self.play_store {
            Some(updater) => {
                updater.report_flow_result(outcome);
                true
            }
            None => false,
        }
    }

    /// Package kept from the last successful download
    pub fn staged_package(&self) -> Option<PathBuf> {
        self.staged.lock().clone()
    }

    pub fn get_platform_version(&self) -> String {
        platform_version(self.config.platform_label.as_deref())
    }

    pub async fn check_for_update(&self, args: CheckForUpdateArgs) -> Result<UpdateCheckResult> {
        if args.use_platform_store {
            return self.updater.check_for_update().await;
        }

        let (update_url, current_version) =
            match (non_empty(args.update_url), non_empty(args.current_version)) {
                (Some(url), Some(version)) => (url, version),
                _ => {
                    return Err(BridgeError::InvalidArguments(
                        "updateUrl and currentVersion are required for direct update checks"
                            .to_string(),
                    ))
                }
            };

        self.checker.check(&update_url, &current_version).await
    }

    pub async fn is_update_available(&self) -> Result<bool> {
        self.updater.is_update_available().await
    }

    pub async fn start_flexible_update(&self) -> Result<UpdateFlowStart> {
        self.updater.start_update(UpdateMode::Flexible).await
    }

    pub async fn start_immediate_update(&self) -> Result<UpdateFlowStart> {
        self.updater.start_update(UpdateMode::Immediate).await
    }

    pub async fn complete_flexible_update(&self) -> Result<()> {
        let staged = self.staged_package();
        self.updater.complete_update(staged.as_deref()).await
    }

    /// Fetch a package and hand it to the platform
    ///
    /// Progress goes to the event sink; the returned result is the only
    /// terminal signal. Any previously staged package is forgotten first, so
    /// a failed or cancelled download leaves nothing to complete.
    pub async fn download_and_install_apk(&self, args: DownloadArgs) -> Result<PackageDelivery> {
        let url = non_empty(args.download_url)
            .ok_or_else(|| BridgeError::InvalidArguments("downloadUrl is required".to_string()))?;

        if self.updater.package_handoff() == PackageHandoff::OpenUrl {
            self.launcher.open_url(&url).map_err(|e| {
                tracing::warn!("Cannot open {}: {}", url, e);
                BridgeError::CannotOpenUrl { url: url.clone() }
            })?;
            return Ok(PackageDelivery::OpenedUrl { url });
        }

        let mut request = DownloadRequest::new(&url, self.config.download.package_path());
        if let Some(sha256) = non_empty(args.sha256) {
            request = request.with_sha256(sha256);
        }

        self.staged.lock().take();
        let handle = self.downloader.start(request).await;
        let sink = Arc::clone(&self.sink);
        let completed = handle
            .wait_with_progress(move |event| {
                sink.emit(UpdateEvent::Progress {
                    progress: event.percent,
                })
            })
            .await
            .into_result()?;

        *self.staged.lock() = Some(completed.path.clone());
        self.updater.install_package(&completed.path).await?;

        Ok(PackageDelivery::Installed {
            path: completed.path,
            bytes: completed.bytes,
        })
    }

    /// Cancel the running download; false when none was running
    pub async fn cancel_download(&self) -> bool {
        self.downloader.cancel_active().await
    }

    /// Dispatch a host method call
    pub async fn handle(&self, method: &str, args: Value) -> std::result::Result<Value, CommandError> {
        tracing::debug!("Handling {}", method);
        self.dispatch(method, args).await.map_err(|e| {
            tracing::warn!("{} failed: {}", method, e);
            CommandError::from(e)
        })
    }

    async fn dispatch(&self, method: &str, args: Value) -> Result<Value> {
        match method {
            "getPlatformVersion" => Ok(Value::String(self.get_platform_version())),
            "checkForUpdate" => to_value(self.check_for_update(parse_args(args)?).await?),
            "startFlexibleUpdate" => to_value(self.start_flexible_update().await?),
            "startImmediateUpdate" => to_value(self.start_immediate_update().await?),
            "completeFlexibleUpdate" => {
                self.complete_flexible_update().await?;
                Ok(Value::Bool(true))
            }
            "downloadAndInstallApk" => {
                to_value(self.download_and_install_apk(parse_args(args)?).await?)
            }
            "isUpdateAvailable" => Ok(Value::Bool(self.is_update_available().await?)),
            "cancelDownload" => Ok(Value::Bool(self.cancel_download().await)),
            other => Err(BridgeError::NotImplemented {
                method: other.to_string(),
            }),
        }
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| BridgeError::InvalidArguments(e.to_string()))
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| BridgeError::Parse(e.to_string()))
}
