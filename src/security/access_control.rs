//! Access control for the passthrough endpoint.
//!
//! Off unless `passthrough.require_auth` is set. When on, a request passes if
//! its `token` query parameter or its bearer token is a known API key.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::api_keys::{bearer_token, ApiKeySet};

/// Key set and on/off switch for the passthrough gate.
#[derive(Clone)]
pub struct AccessControlState {
    pub keys: Arc<ApiKeySet>,
    pub enabled: bool,
}

pub async fn access_control_middleware(
    State(state): State<AccessControlState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.enabled {
        return next.run(req).await;
    }

    let query_token = req.uri().query().and_then(token_param);
    let authorized = query_token.as_deref().is_some_and(|t| state.keys.contains(t))
        || bearer_token(req.headers()).is_some_and(|t| state.keys.contains(t));

    if authorized {
        next.run(req).await
    } else {
        warn!(path = %req.uri().path(), "Rejected unauthenticated passthrough request");
        (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
    }
}

/// First `token` parameter of a query string, percent-decoded.
fn token_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "token")
        .map(|(_, value)| value.into_owned())
}
