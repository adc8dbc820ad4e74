//! Tests for the update module
//!
//! Decision engine unit tests plus updater tests against fake vendor services
//! and ad-hoc axum routers.

use super::*;
use crate::core::error::BridgeError;
use crate::core::types::{PackageHandoff, UpdateMode, UpdaterKind};
use crate::events::{ChannelSink, FlowResult, UpdateEvent};
use crate::platform::LogOnlyLauncher;
use crate::test_support::{refused_url, serve, shared, FailingLauncher, FakeAppUpdateService};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn descriptor(version: &str) -> UpdateDescriptor {
    UpdateDescriptor {
        version: version.to_string(),
        ..Default::default()
    }
}

fn checker() -> DirectUpdateChecker {
    DirectUpdateChecker::new(Duration::from_secs(5), Duration::from_secs(5)).unwrap()
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<UpdateEvent>) -> Vec<UpdateEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn descriptor_router() -> Router {
    Router::new()
        .route(
            "/version",
            get(|| async {
                Json(json!({
                    "version": "1.2.0",
                    "build": 120,
                    "priority": 3,
                    "forceUpdate": false,
                    "updateAvailable": true,
                    "downloadUrl": "http://localhost/downloads/app-v1.2.0.apk",
                    "releaseNotes": "Bug fixes"
                }))
            }),
        )
        .route(
            "/force",
            get(|| async {
                Json(json!({
                    "version": "2.0.0",
                    "priority": 5,
                    "forceUpdate": true,
                    "downloadUrl": "http://localhost/downloads/app-v2.0.0.apk"
                }))
            }),
        )
        .route("/broken", get(|| async { "this is not json" }))
        .route("/no-version", get(|| async { Json(json!({ "build": 3 })) }))
        .route(
            "/error",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
}

// ============================================================================
// Decision Engine Tests
// ============================================================================

#[test]
fn test_decide_direct_newer() {
    let mut desc = descriptor("1.2.0");
    desc.download_url = Some("http://host/app.apk".to_string());
    desc.priority = Some(3);
    desc.release_notes = Some("notes".to_string());

    let result = decide_direct("1.0.0", &desc);
    assert!(result.update_available);
    assert!(result.direct_update);
    assert_eq!(result.current_version, "1.0.0");
    assert_eq!(result.remote_version, "1.2.0");
    assert_eq!(result.download_url.as_deref(), Some("http://host/app.apk"));
    assert_eq!(result.priority, Some(3));
    assert_eq!(result.release_notes.as_deref(), Some("notes"));
    assert_eq!(result.urgency(), UpdateUrgency::Optional);
}

#[test]
fn test_decide_direct_same_and_older() {
    assert!(!decide_direct("1.2", &descriptor("1.2.0")).update_available);
    assert!(!decide_direct("1.3.0", &descriptor("1.2.0")).update_available);
}

#[test]
fn test_decide_direct_ignores_descriptor_flag() {
    let mut desc = descriptor("1.0.0");
    desc.update_available = Some(true);
    desc.force_update = Some(true);

    let result = decide_direct("1.0.0", &desc);
    assert!(!result.update_available);
    assert_eq!(result.urgency(), UpdateUrgency::None);
}

#[test]
fn test_decide_store_trusts_report() {
    let report = StoreReport {
        update_available: true,
        remote_version: "0.9".to_string(),
        priority: Some(1),
        ..Default::default()
    };
    let result = decide_store("1.0", &report);
    assert!(result.update_available);
    assert!(!result.direct_update);

    let report = StoreReport {
        update_available: false,
        remote_version: "9.0".to_string(),
        ..Default::default()
    };
    assert!(!decide_store("1.0", &report).update_available);
}

#[test]
fn test_urgency_levels() {
    let mut result = UpdateCheckResult {
        update_available: true,
        ..Default::default()
    };
    assert_eq!(result.urgency(), UpdateUrgency::Optional);

    result.priority = Some(4);
    assert_eq!(result.urgency(), UpdateUrgency::HighPriority);

    result.priority = Some(5);
    assert_eq!(result.urgency(), UpdateUrgency::Mandatory);

    result.priority = Some(1);
    result.force_update = Some(true);
    assert!(result.is_mandatory());

    result.update_available = false;
    assert_eq!(result.urgency(), UpdateUrgency::None);
}

#[test]
fn test_check_result_serializes_camel_case() {
    let result = decide_direct("1.0.0", &descriptor("1.1.0"));
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["updateAvailable"], true);
    assert_eq!(value["currentVersion"], "1.0.0");
    assert_eq!(value["remoteVersion"], "1.1.0");
    assert_eq!(value["directUpdate"], true);
    assert!(value.get("downloadUrl").is_none());
}

#[test]
fn test_descriptor_parses_minimal_document() {
    let desc: UpdateDescriptor = serde_json::from_str(r#"{"version": "3.1"}"#).unwrap();
    assert_eq!(desc.version, "3.1");
    assert_eq!(desc.force_update, None);
}

proptest! {
    #[test]
    fn prop_direct_availability_matches_comparison(
        a in prop::collection::vec(0u32..50, 1..4),
        b in prop::collection::vec(0u32..50, 1..4),
    ) {
        let remote = a.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(".");
        let local = b.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(".");
        let result = decide_direct(&local, &descriptor(&remote));
        prop_assert_eq!(result.update_available, crate::version::is_newer(&remote, &local));
    }

    #[test]
    fn prop_force_update_is_always_mandatory(priority in -10i32..10) {
        let result = UpdateCheckResult {
            update_available: true,
            priority: Some(priority),
            force_update: Some(true),
            ..Default::default()
        };
        prop_assert_eq!(result.urgency(), UpdateUrgency::Mandatory);
    }
}

// ============================================================================
// Direct Checker Tests
// ============================================================================

#[tokio::test]
async fn test_direct_check_available() {
    let base = serve(descriptor_router()).await;
    let result = checker().check(&format!("{}/version", base), "1.0.0").await.unwrap();

    assert!(result.update_available);
    assert_eq!(result.remote_version, "1.2.0");
    assert_eq!(result.urgency(), UpdateUrgency::Optional);
    assert_eq!(
        result.download_url.as_deref(),
        Some("http://localhost/downloads/app-v1.2.0.apk")
    );
}

#[tokio::test]
async fn test_direct_check_force_update_is_mandatory() {
    let base = serve(descriptor_router()).await;
    let result = checker().check(&format!("{}/force", base), "1.0.0").await.unwrap();
    assert_eq!(result.urgency(), UpdateUrgency::Mandatory);
}

#[tokio::test]
async fn test_direct_check_up_to_date() {
    let base = serve(descriptor_router()).await;
    let result = checker().check(&format!("{}/version", base), "1.2.0").await.unwrap();
    assert!(!result.update_available);
}

#[tokio::test]
async fn test_direct_check_parse_error() {
    let base = serve(descriptor_router()).await;
    let err = checker().check(&format!("{}/broken", base), "1.0.0").await.unwrap_err();
    assert_eq!(err.code(), "PARSE_ERROR");

    let err = checker().check(&format!("{}/no-version", base), "1.0.0").await.unwrap_err();
    assert_eq!(err.code(), "PARSE_ERROR");
}

#[tokio::test]
async fn test_direct_check_http_error() {
    let base = serve(descriptor_router()).await;
    let err = checker().check(&format!("{}/error", base), "1.0.0").await.unwrap_err();
    assert_eq!(err.code(), "NETWORK_ERROR");
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_direct_check_connection_refused() {
    let err = checker()
        .check(&format!("{}/version", refused_url()), "1.0.0")
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Network(_)));
}

// ============================================================================
// Direct URL Updater Tests
// ============================================================================

#[tokio::test]
async fn test_direct_updater_check_and_flows() {
    let base = serve(descriptor_router()).await;
    let launcher = Arc::new(LogOnlyLauncher::new());
    let updater = DirectUrlUpdater::new(
        checker(),
        launcher.clone(),
        Some(format!("{}/version", base)),
        "1.1.0",
    );

    assert_eq!(updater.kind(), UpdaterKind::DirectUrl);
    assert_eq!(updater.package_handoff(), PackageHandoff::DownloadAndInstall);
    assert!(updater.is_update_available().await.unwrap());

    let err = updater.start_update(UpdateMode::Flexible).await.unwrap_err();
    assert_eq!(err.code(), "NOT_SUPPORTED");

    let err = updater.complete_update(None).await.unwrap_err();
    assert_eq!(err.code(), "NO_DOWNLOAD");
}

#[tokio::test]
async fn test_direct_updater_completes_staged_package() {
    let temp_dir = TempDir::new().unwrap();
    let package = temp_dir.path().join("update.apk");
    std::fs::write(&package, b"apk").unwrap();

    let launcher = Arc::new(LogOnlyLauncher::new());
    let updater = DirectUrlUpdater::new(checker(), launcher.clone(), None, "1.0.0");

    updater.complete_update(Some(&package)).await.unwrap();
    assert_eq!(launcher.installed_packages(), vec![package.clone()]);
    assert_eq!(updater.last_installed(), Some(package));

    let gone = temp_dir.path().join("gone.apk");
    let err = updater.complete_update(Some(&gone)).await.unwrap_err();
    assert_eq!(err.code(), "NO_DOWNLOAD");
}

#[tokio::test]
async fn test_direct_updater_install_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let package = temp_dir.path().join("update.apk");
    std::fs::write(&package, b"apk").unwrap();

    let updater = DirectUrlUpdater::new(checker(), Arc::new(FailingLauncher), None, "1.0.0");
    let err = updater.install_package(&package).await.unwrap_err();
    assert_eq!(err.code(), "INSTALL_FAILED");
}

#[tokio::test]
async fn test_direct_updater_without_url() {
    let updater = DirectUrlUpdater::new(checker(), Arc::new(LogOnlyLauncher::new()), None, "1.0.0");
    let err = updater.check_for_update().await.unwrap_err();
    assert_eq!(err.code(), "INVALID_ARGUMENTS");
}

// ============================================================================
// Play Store Updater Tests
// ============================================================================

fn play_updater(
    service: Arc<FakeAppUpdateService>,
) -> (PlayStoreUpdater, tokio::sync::mpsc::UnboundedReceiver<UpdateEvent>) {
    let (sink, rx) = ChannelSink::channel();
    let updater = PlayStoreUpdater::new(service, Arc::new(sink), Arc::new(LogOnlyLauncher::new()), "1.0.0");
    (updater, rx)
}

#[tokio::test]
async fn test_play_check_requires_activity() {
    let service = shared(FakeAppUpdateService::available());
    let (updater, _rx) = play_updater(service);

    let err = updater.check_for_update().await.unwrap_err();
    assert_eq!(err.code(), "NO_ACTIVITY");

    let scope = updater.attach_activity();
    let result = updater.check_for_update().await.unwrap();
    assert!(result.update_available);
    assert_eq!(result.remote_version, "42");
    assert_eq!(result.immediate_update_allowed, Some(true));
    assert_eq!(result.flexible_update_allowed, Some(true));
    assert_eq!(result.priority, Some(2));
    assert!(!result.direct_update);

    drop(scope);
    assert!(!updater.has_activity());
    assert!(updater.check_for_update().await.is_err());
}

#[tokio::test]
async fn test_play_check_failure_codes() {
    let service = shared(FakeAppUpdateService::available());
    service.fail_info("store offline");
    let (updater, _rx) = play_updater(service);
    let _scope = updater.attach_activity();

    let err = updater.check_for_update().await.unwrap_err();
    assert_eq!(err.code(), "UPDATE_CHECK_FAILED");

    let err = updater.is_update_available().await.unwrap_err();
    assert_eq!(err.code(), "CHECK_FAILED");
}

#[tokio::test]
async fn test_play_start_requires_activity() {
    let service = shared(FakeAppUpdateService::available());
    let (updater, _rx) = play_updater(service.clone());

    let err = updater.start_update(UpdateMode::Immediate).await.unwrap_err();
    assert_eq!(err.code(), "NOT_AVAILABLE");
    assert!(service.started.lock().is_empty());
}

#[tokio::test]
async fn test_play_start_immediate() {
    let service = shared(FakeAppUpdateService::available());
    let (updater, _rx) = play_updater(service.clone());
    let _scope = updater.attach_activity();

    let start = updater.start_update(UpdateMode::Immediate).await.unwrap();
    assert_eq!(start, UpdateFlowStart::Started { mode: UpdateMode::Immediate });
    assert_eq!(*service.started.lock(), vec![UpdateMode::Immediate]);
    assert!(!updater.has_listener());
}

#[tokio::test]
async fn test_play_start_mode_not_allowed() {
    let service = shared(FakeAppUpdateService::with_info(AppUpdateInfo {
        availability: UpdateAvailability::Available,
        flexible_allowed: false,
        immediate_allowed: true,
        ..Default::default()
    }));
    let (updater, _rx) = play_updater(service.clone());
    let _scope = updater.attach_activity();

    let err = updater.start_update(UpdateMode::Flexible).await.unwrap_err();
    assert_eq!(err.code(), "UPDATE_NOT_AVAILABLE");
    assert!(err.to_string().contains("flexible"));
}

#[tokio::test]
async fn test_play_start_when_no_update() {
    let service = shared(FakeAppUpdateService::not_available());
    let (updater, _rx) = play_updater(service);
    let _scope = updater.attach_activity();

    let err = updater.start_update(UpdateMode::Immediate).await.unwrap_err();
    assert_eq!(err.code(), "UPDATE_NOT_AVAILABLE");
}

#[tokio::test]
async fn test_play_start_vendor_failure() {
    let service = shared(FakeAppUpdateService::available());
    *service.start_result.lock() = Err(ServiceError::Api {
        code: -6,
        message: "intent failed".to_string(),
    });
    let (updater, _rx) = play_updater(service);
    let _scope = updater.attach_activity();

    let err = updater.start_update(UpdateMode::Immediate).await.unwrap_err();
    assert_eq!(err.code(), "UPDATE_FAILED");
}

#[tokio::test]
async fn test_play_flexible_listener_registered_once() {
    let service = shared(FakeAppUpdateService::available());
    let (updater, _rx) = play_updater(service.clone());
    let _scope = updater.attach_activity();

    updater.start_update(UpdateMode::Flexible).await.unwrap();
    updater.start_update(UpdateMode::Flexible).await.unwrap();
    assert_eq!(service.listener_count(), 1);

    drop(updater);
    assert_eq!(service.listener_count(), 0);
}

#[tokio::test]
async fn test_play_install_states_become_events() {
    let service = shared(FakeAppUpdateService::available());
    let (updater, mut rx) = play_updater(service.clone());
    let _scope = updater.attach_activity();
    updater.start_update(UpdateMode::Flexible).await.unwrap();

    service.push_state(InstallState::new(InstallStatus::Pending));
    service.push_state(InstallState::downloading(0, 0));
    service.push_state(InstallState::downloading(50, 200));
    service.push_state(InstallState::downloading(200, 200));
    service.push_state(InstallState::new(InstallStatus::Downloaded));
    service.push_state(InstallState::new(InstallStatus::Installed));
    service.push_state(InstallState::new(InstallStatus::Failed));

    assert_eq!(
        drain(&mut rx),
        vec![
            UpdateEvent::Progress { progress: 25 },
            UpdateEvent::Progress { progress: 100 },
            UpdateEvent::Downloaded,
            UpdateEvent::Installed,
            UpdateEvent::Failed {
                error: "Installation failed".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_play_complete_requires_downloaded_state() {
    let service = shared(FakeAppUpdateService::available());
    let (updater, _rx) = play_updater(service.clone());
    let _scope = updater.attach_activity();

    let err = updater.complete_update(None).await.unwrap_err();
    assert_eq!(err.code(), "NO_DOWNLOAD");

    updater.start_update(UpdateMode::Flexible).await.unwrap();
    service.push_state(InstallState::new(InstallStatus::Downloaded));
    assert!(updater.is_download_ready());

    updater.complete_update(None).await.unwrap();
    assert_eq!(service.completed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_play_complete_vendor_failure() {
    let service = shared(FakeAppUpdateService::available());
    *service.complete_result.lock() = Err(ServiceError::Unavailable("restart refused".to_string()));
    let (updater, _rx) = play_updater(service.clone());
    let _scope = updater.attach_activity();

    updater.start_update(UpdateMode::Flexible).await.unwrap();
    service.push_state(InstallState::new(InstallStatus::Downloaded));

    let err = updater.complete_update(None).await.unwrap_err();
    assert_eq!(err.code(), "COMPLETE_UPDATE_FAILED");
}

#[tokio::test]
async fn test_play_detach_listener_stops_events() {
    let service = shared(FakeAppUpdateService::available());
    let (updater, mut rx) = play_updater(service.clone());
    let _scope = updater.attach_activity();
    updater.start_update(UpdateMode::Flexible).await.unwrap();

    updater.detach_listener();
    assert_eq!(service.listener_count(), 0);
    service.push_state(InstallState::new(InstallStatus::Downloaded));
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_flow_outcome_mapping() {
    let service = shared(FakeAppUpdateService::available());
    let (updater, mut rx) = play_updater(service);

    updater.report_flow_result(FlowOutcome::Ok);
    updater.report_flow_result(FlowOutcome::Canceled);
    updater.report_flow_result(FlowOutcome::Other(1));

    assert_eq!(
        drain(&mut rx),
        vec![
            UpdateEvent::Result { result: FlowResult::Success },
            UpdateEvent::Result { result: FlowResult::Cancelled },
            UpdateEvent::Result { result: FlowResult::Failed },
        ]
    );
}

#[test]
fn test_nested_activity_scopes() {
    let service = shared(FakeAppUpdateService::available());
    let (updater, _rx) = play_updater(service);

    let outer = updater.attach_activity();
    let inner = updater.attach_activity();
    drop(inner);
    assert!(updater.has_activity());
    drop(outer);
    assert!(!updater.has_activity());
}

// ============================================================================
// App Store Updater Tests
// ============================================================================

fn lookup_router() -> Router {
    Router::new().route(
        "/lookup",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            match params.get("bundleId").map(String::as_str) {
                Some("com.example.app") => Json(json!({
                    "resultCount": 1,
                    "results": [{
                        "version": "2.3.1",
                        "trackId": 1234567890,
                        "releaseNotes": "New look"
                    }]
                })),
                _ => Json(json!({ "resultCount": 0, "results": [] })),
            }
        }),
    )
}

fn app_store_updater(
    base: &str,
    bundle_id: &str,
    launcher: Arc<dyn crate::platform::PlatformLauncher>,
) -> AppStoreUpdater {
    AppStoreUpdater::new(
        reqwest::Client::new(),
        launcher,
        format!("{}/lookup", base),
        bundle_id,
        "2.3.0",
    )
}

#[tokio::test]
async fn test_app_store_check() {
    let base = serve(lookup_router()).await;
    let updater = app_store_updater(&base, "com.example.app", Arc::new(LogOnlyLauncher::new()));

    let result = updater.check_for_update().await.unwrap();
    assert!(result.update_available);
    assert_eq!(result.remote_version, "2.3.1");
    assert_eq!(result.current_version, "2.3.0");
    assert_eq!(
        result.store_url.as_deref(),
        Some("https://apps.apple.com/app/id1234567890")
    );
    assert_eq!(result.release_notes.as_deref(), Some("New look"));
    assert_eq!(updater.package_handoff(), PackageHandoff::OpenUrl);
}

#[tokio::test]
async fn test_app_store_unknown_bundle_is_parse_error() {
    let base = serve(lookup_router()).await;
    let updater = app_store_updater(&base, "com.example.missing", Arc::new(LogOnlyLauncher::new()));

    let err = updater.check_for_update().await.unwrap_err();
    assert_eq!(err.code(), "PARSE_ERROR");
}

#[tokio::test]
async fn test_app_store_network_error() {
    let updater = app_store_updater(&refused_url(), "com.example.app", Arc::new(LogOnlyLauncher::new()));
    let err = updater.is_update_available().await.unwrap_err();
    assert_eq!(err.code(), "NETWORK_ERROR");
}

#[tokio::test]
async fn test_app_store_start_opens_store_page() {
    let base = serve(lookup_router()).await;
    let launcher = Arc::new(LogOnlyLauncher::new());
    let updater = app_store_updater(&base, "com.example.app", launcher.clone());

    for mode in [UpdateMode::Flexible, UpdateMode::Immediate] {
        let start = updater.start_update(mode).await.unwrap();
        assert_eq!(
            start,
            UpdateFlowStart::RedirectedToStore {
                url: "https://apps.apple.com/app/id1234567890".to_string()
            }
        );
    }
    assert_eq!(launcher.opened_urls().len(), 2);
}

#[tokio::test]
async fn test_app_store_cannot_open_url() {
    let base = serve(lookup_router()).await;
    let updater = app_store_updater(&base, "com.example.app", Arc::new(FailingLauncher));

    let err = updater.start_update(UpdateMode::Immediate).await.unwrap_err();
    assert_eq!(err.code(), "CANNOT_OPEN_URL");
}

#[tokio::test]
async fn test_app_store_unsupported_operations() {
    let updater = app_store_updater(&refused_url(), "com.example.app", Arc::new(LogOnlyLauncher::new()));

    let err = updater.complete_update(None).await.unwrap_err();
    assert_eq!(err.code(), "NOT_SUPPORTED");

    let err = updater
        .install_package(std::path::Path::new("/tmp/app.ipa"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_SUPPORTED");
}
