//! Message parse handler.
//!
//! `POST /` takes the raw message text as the request body and answers with
//! the extracted [`MessageInfo`](crate::extraction::MessageInfo) as JSON.
//!
//! ```bash
//! curl -d '@bob (coffee) http://example.com/page' http://localhost:9080/
//! # {"mentions":["bob"],"emoticons":["coffee"],
//! #  "links":[{"url":"http://example.com/page","title":"Example Domain"}]}
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use super::state::AppState;
use crate::error::ServerError;

/// Content type of successful parse responses
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Error body returned when a request cannot be served
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

impl ErrorResponse {
    fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// `POST /` and `POST /parse`
///
/// Non-UTF-8 bytes are replaced rather than rejected. If the client goes
/// away the handler future is dropped, which abandons outstanding fetches.
#[instrument(skip_all, fields(bytes = tracing::field::Empty))]
pub async fn parse_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            state.record_error();
            let err = ServerError::UnreadableBody(rejection.body_text());
            warn!(error = %err, "Rejecting request");
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            return ErrorResponse {
                error: err.to_string(),
            }
            .into_response_with(status);
        }
    };
    tracing::Span::current().record("bytes", body.len());

    let text = String::from_utf8_lossy(&body);
    let started = Instant::now();
    let info = state
        .parser()
        .parse_with_cancel(&text, &CancellationToken::new())
        .await;
    state.record_parse(&info, started.elapsed());

    match serde_json::to_vec(&info) {
        Ok(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
            json,
        )
            .into_response(),
        Err(e) => {
            state.record_error();
            warn!(error = %e, "Unable to serialize response");
            ErrorResponse {
                error: "Unable to serialize response".to_string(),
            }
            .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::extraction::{LinkResolver, MessageParser, PageFetcher};
    use async_trait::async_trait;

    struct TitleFetcher;

    #[async_trait]
    impl PageFetcher for TitleFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Ok("<title>Fetched</title>".to_string())
        }
    }

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(MessageParser::new(LinkResolver::new(
            Arc::new(TitleFetcher),
            2,
        ))))
    }

    #[tokio::test]
    async fn test_parse_handler_ok() {
        let state = state();
        let response = parse_handler(
            State(state.clone()),
            Ok(Bytes::from_static(b"@bob http://a.com")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            JSON_CONTENT_TYPE
        );
        assert_eq!(state.messages_parsed(), 1);
        assert_eq!(state.links_resolved(), 1);
    }

    #[tokio::test]
    async fn test_parse_handler_invalid_utf8() {
        let state = state();
        let response = parse_handler(
            State(state.clone()),
            Ok(Bytes::from_static(b"@bob \xff\xfe (smile)")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.error_count(), 0);
    }
}
