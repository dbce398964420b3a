//! HTTP handlers
//!
//! ```text
//! POST /, /parse ──▶ parse_handler ──▶ MessageParser ──▶ JSON MessageInfo
//! GET  /health   ──▶ health_handler
//! GET  /status   ──▶ status_handler ──▶ AppState counters
//! ```

pub mod parse;
pub mod state;
pub mod status;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::cors::cors_layer;

pub use parse::{parse_handler, ErrorResponse};
pub use state::{AppState, LatencyHistogram, LatencyMetrics};
pub use status::{health_handler, status_handler, HealthResponse, StatusResponse};

/// Build the full application router.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use message_parser::config::Config;
/// use message_parser::extraction::{LinkResolver, MessageParser};
/// use message_parser::handlers::{router, AppState};
///
/// let config = Config::default();
/// let resolver = LinkResolver::from_config(&config.resolver_config()).unwrap();
/// let state = Arc::new(AppState::new(MessageParser::new(resolver)));
/// let app = router(state, &config);
/// ```
pub fn router(state: Arc<AppState>, config: &Config) -> Router {
    Router::new()
        .route("/", post(parse_handler))
        .route("/parse", post(parse_handler))
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .layer(RequestBodyLimitLayer::new(config.max_request_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
