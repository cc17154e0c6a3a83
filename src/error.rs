//! Proxy error taxonomy.
//!
//! # Design Decisions
//! - Request-side aborts are not errors; they become `InvalidTarget` or
//!   `Unauthorized` only once the pipeline has stopped
//! - Processor errors propagate and fail the whole request
//! - Content rewriters never surface here; see `rewrite::RewriteError`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors that fail a proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Missing, malformed or non-http(s) target URL.
    #[error("{0}")]
    InvalidTarget(String),

    /// Missing or unknown API key.
    #[error("unauthorized")]
    Unauthorized,

    /// The upstream could not be reached (DNS, connect, timeout).
    #[error("error proxying request: {0}")]
    Upstream(#[source] reqwest::Error),

    /// The upstream answered but its body could not be read.
    #[error("error reading upstream body: {source}")]
    UpstreamBody {
        status: StatusCode,
        #[source]
        source: reqwest::Error,
    },

    /// Anything else that went wrong inside the proxy.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// HTTP status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamBody { status, .. } => {
                if status.is_client_error() || status.is_server_error() {
                    *status
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ProxyError::InvalidTarget(_) => "invalid_target",
            ProxyError::Unauthorized => "unauthorized",
            ProxyError::Upstream(_) => "upstream_unreachable",
            ProxyError::UpstreamBody { .. } => "upstream_body",
            ProxyError::Internal(_) => "internal_error",
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            ProxyError::InvalidTarget("ftp://x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ProxyError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ProxyError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let response = ProxyError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "unauthorized");
    }
}
