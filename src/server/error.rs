//! Mock server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::net::SocketAddr;
use thiserror::Error;

/// Mock server error type
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Scenario not found: {name}")]
    ScenarioNotFound { name: String, available: Vec<String> },

    #[error("Invalid file name '{name}'")]
    InvalidFilename { name: String },

    #[error("Server bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {reason}")]
    Internal { reason: String },
}

impl ServerError {
    /// Check if this error should result in a 404 Not Found response
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServerError::ScenarioNotFound { .. })
    }

    /// Check if this error should result in a 400 Bad Request response
    pub fn is_bad_request(&self) -> bool {
        matches!(self, ServerError::InvalidFilename { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.is_bad_request() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ServerError::ScenarioNotFound { available, .. } => json!({
                "error": "Scenario not found",
                "available": available,
            }),
            ServerError::InvalidFilename { name } => json!({
                "error": format!("Invalid file name '{}'", name),
            }),
            other => {
                tracing::error!("Server error: {}", other);
                json!({ "error": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}
