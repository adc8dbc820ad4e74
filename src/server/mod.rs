//! Mock update server
//!
//! A small axum service used in development and tests:
//! - Canned update descriptors per scenario (`/api/version/:scenario`)
//! - Lazily generated packages streamed from `/downloads/:filename`
//! - Scenario info, status and an HTML index

mod error;
mod routes;
mod scenarios;
mod server;


pub use error::ServerError;
pub use routes::{validate_filename, PACKAGE_CONTENT_TYPE};
pub use scenarios::{Scenario, DEFAULT_SCENARIO};
pub use server::{
    build_router, mock_payload, MockServerConfig, MockUpdateServer, ServerState,
    DEFAULT_MOCK_SERVER_PORT, DEFAULT_PAYLOAD_SIZE, PAYLOAD_PATTERN,
};
