//! Status and health check handlers.
//!
//! - `/status` - Server status with parse counters and latency
//! - `/health` - Simple liveness check for load balancers
//!
//! # Example Response
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "name": "message-parser",
//!   "uptime_seconds": 3600,
//!   "messages_parsed": 1024,
//!   "links_resolved": 800,
//!   "links_fallback": 37,
//!   "errors": 2,
//!   "latency": { "p50_ms": 120.5, "p95_ms": 980.2, "p99_ms": 4890.7, ... },
//!   "status": "running",
//!   "timestamp": "2026-01-01T12:00:00Z"
//! }
//! ```

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::state::{AppState, LatencyMetrics};

/// Server version from Cargo.toml
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name from Cargo.toml
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

/// Health check response for simple liveness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (always "healthy" if responding)
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Detailed server status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server version
    pub version: String,

    /// Server name
    pub name: String,

    /// Server uptime in seconds
    pub uptime_seconds: u64,

    /// Messages parsed since start
    pub messages_parsed: u64,

    /// Links returned with a page title
    pub links_resolved: u64,

    /// Links returned with the fallback title
    pub links_fallback: u64,

    /// Request errors since start
    pub errors: u64,

    /// Parse latency percentiles
    pub latency: LatencyMetrics,

    /// Server status (always "running" if responding)
    pub status: String,

    /// RFC 3339 timestamp of when status was generated
    pub timestamp: String,
}

/// `GET /health`
#[instrument(skip_all)]
pub async fn health_handler() -> impl IntoResponse {
    debug!("Health check requested");
    (StatusCode::OK, Json(HealthResponse::default()))
}

/// `GET /status`
#[instrument(skip_all)]
pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Status check requested");

    let response = StatusResponse {
        version: SERVER_VERSION.to_string(),
        name: SERVER_NAME.to_string(),
        uptime_seconds: state.uptime_seconds(),
        messages_parsed: state.messages_parsed(),
        links_resolved: state.links_resolved(),
        links_fallback: state.links_fallback(),
        errors: state.error_count(),
        latency: state.latency_metrics(),
        status: "running".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(response))
}
