//! CORS policy for the parse endpoint
//!
//! Browser chat clients post message text straight to the parser, so the
//! router carries a CORS layer.
//!
//! - **No origins configured**: only `localhost`, `127.0.0.1` and `[::1]` on any port
//! - **`*`**: any origin
//! - **Otherwise**: exact match against the configured origins
//!
//! # Example
//!
//! ```rust,no_run
//! use message_parser::cors::cors_layer;
//!
//! let layer = cors_layer(&["https://chat.example.com".to_string()]);
//! ```

use http::{header::HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Allowed methods for the parser routes
pub const ALLOWED_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

/// Default max age for preflight cache (1 hour)
pub const DEFAULT_MAX_AGE_SECS: u64 = 3600;

/// Build the CORS layer for the configured origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([http::header::CONTENT_TYPE])
        .max_age(Duration::from_secs(DEFAULT_MAX_AGE_SECS));

    if origins.is_empty() {
        return layer.allow_origin(AllowOrigin::predicate(|origin, _| {
            is_localhost_origin(origin)
        }));
    }

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o.trim_end_matches('/')).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Whether an `Origin` header names a loopback host.
///
/// The host is parsed rather than prefix-matched, so
/// `http://localhost.evil.com` is rejected.
pub fn is_localhost_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let Ok(url) = url::Url::parse(origin) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }

    matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]")
    )
}
