//! Mock server routes
//!
//! Handlers for version checks, package downloads, scenario info, status and
//! the HTML index page.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;

use super::error::ServerError;
use super::scenarios::{Scenario, DEFAULT_SCENARIO};
use super::server::ServerState;
use crate::update::UpdateDescriptor;

/// Content type of served packages
pub const PACKAGE_CONTENT_TYPE: &str = "application/vnd.android.package-archive";

fn lookup_scenario(name: &str) -> Result<Scenario, ServerError> {
    name.parse().map_err(|_| ServerError::ScenarioNotFound {
        name: name.to_string(),
        available: Scenario::names(),
    })
}

/// Reject names that would escape the downloads directory
pub fn validate_filename(name: &str) -> Result<(), ServerError> {
    let invalid = name.is_empty()
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(ServerError::InvalidFilename {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Route: GET /api/version
pub async fn default_version(State(state): State<ServerState>) -> Json<UpdateDescriptor> {
    tracing::info!("Version check requested, scenario: {}", DEFAULT_SCENARIO);
    Json(DEFAULT_SCENARIO.descriptor(state.base_url()))
}

/// Route: GET /api/version/:scenario
pub async fn scenario_version(
    State(state): State<ServerState>,
    Path(name): Path<String>,
) -> Result<Json<UpdateDescriptor>, ServerError> {
    let scenario = lookup_scenario(&name)?;
    tracing::info!("Version check requested, scenario: {}", scenario);
    Ok(Json(scenario.descriptor(state.base_url())))
}

/// Stream a package, generating it first if the downloads directory lacks it
///
/// Route: GET /downloads/:filename
pub async fn serve_download(
    State(state): State<ServerState>,
    Path(filename): Path<String>,
) -> Result<Response, ServerError> {
    validate_filename(&filename)?;
    tracing::info!("Download requested: {}", filename);

    let path = state.ensure_payload(&filename).await?;
    let file = tokio::fs::File::open(&path).await?;
    let size = file.metadata().await?.len();
    state.record_download(&filename);

    let stream = ReaderStream::new(file);
    let body = match state.config().chunk_delay {
        Some(delay) => Body::from_stream(stream.then(move |chunk| async move {
            tokio::time::sleep(delay).await;
            chunk
        })),
        None => Body::from_stream(stream),
    };

    let headers = [
        (header::CONTENT_TYPE, PACKAGE_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
        (header::CONTENT_LENGTH, size.to_string()),
    ];
    Ok((StatusCode::OK, headers, body).into_response())
}

/// Route: GET /test/:scenario
pub async fn scenario_info(
    State(state): State<ServerState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let scenario = lookup_scenario(&name)?;
    let descriptor = scenario.descriptor(state.base_url());

    Ok(Json(json!({
        "message": format!("Test scenario: {}", scenario),
        "testUrl": format!("{}/api/version/{}", state.base_url(), scenario),
        "downloadUrl": descriptor.download_url.clone(),
        "config": descriptor,
    })))
}

/// Route: GET /status
pub async fn status(State(state): State<ServerState>) -> Json<Value> {
    Json(json!({
        "server": "mock update server",
        "status": "running",
        "port": state.port(),
        "scenarios": Scenario::names(),
        "endpoints": {
            "versionCheck": "/api/version/:scenario",
            "download": "/downloads/:filename",
            "test": "/test/:scenario",
        },
        "downloads": state.download_counts(),
    }))
}

/// Route: GET /
pub async fn index(State(state): State<ServerState>) -> Html<String> {
    let scenarios: String = Scenario::ALL
        .iter()
        .map(|s| format!("<li><a href=\"/test/{0}\">{0}</a> - {1}</li>", s, s.summary()))
        .collect();

    Html(format!(
        r#"<h1>Mock Update Server</h1>
<p>Server running at {base}</p>
<h2>Available Test Scenarios:</h2>
<ul>{scenarios}</ul>
<h2>API Endpoints:</h2>
<ul>
  <li><code>GET /api/version/:scenario</code> - Version check</li>
  <li><code>GET /downloads/:filename</code> - File download</li>
  <li><code>GET /test/:scenario</code> - Test scenario info</li>
  <li><code>GET /status</code> - Server status</li>
</ul>
<h2>Usage:</h2>
<pre><code>update-bridge check --update-url {base}/api/version/optional-update --current-version 1.0.0</code></pre>
"#,
        base = state.base_url(),
        scenarios = scenarios,
    ))
}
