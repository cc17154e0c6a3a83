//! Passthrough proxy: fetch a URL and stream it back unchanged.
//!
//! No pipelines, no rewriting. Only a few request headers are forwarded and
//! the reply gets permissive CORS headers.

use axum::body::Body;
use axum::http::header::{
    ACCEPT, ACCEPT_LANGUAGE, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT,
};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use reqwest::Client;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::ProxyError;
use crate::http::response::{stream_body, DEFAULT_CONTENT_TYPE};

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Fetches arbitrary http(s) URLs for browser clients.
pub struct PassthroughService {
    client: Client,
    user_agent: HeaderValue,
}

impl PassthroughService {
    /// `user_agent` is sent when the caller sends none.
    pub fn new(client: Client, user_agent: &str) -> Self {
        let user_agent = HeaderValue::from_str(user_agent).unwrap_or_else(|e| {
            warn!(user_agent, error = %e, "Invalid default user agent, sending none");
            HeaderValue::from_static("")
        });
        Self { client, user_agent }
    }

    pub async fn fetch(&self, inbound: &HeaderMap, target_url: &str) -> Result<Response, ProxyError> {
        let url = parse_target(target_url)?;
        let outbound = self.outbound_headers(inbound);

        debug!(target_url = %url, "Passthrough fetch");
        let upstream = self
            .client
            .get(url)
            .headers(outbound)
            .send()
            .await
            .map_err(|e| {
                error!(target_url, error = %e, "Passthrough fetch failed");
                ProxyError::Upstream(e)
            })?;

        let status = upstream.status();
        let upstream_headers = upstream.headers().clone();

        let mut response = Response::new(Body::empty());
        *response.status_mut() = status;
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
        for name in [CACHE_CONTROL, CONTENT_ENCODING] {
            if let Some(value) = upstream_headers.get(&name) {
                headers.insert(name, value.clone());
            }
        }
        headers.insert(
            CONTENT_TYPE,
            upstream_headers
                .get(CONTENT_TYPE)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
        );

        *response.body_mut() = stream_body(upstream);
        Ok(response)
    }

    fn outbound_headers(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match inbound.get(USER_AGENT) {
            Some(ua) => {
                headers.insert(USER_AGENT, ua.clone());
            }
            None if !self.user_agent.is_empty() => {
                headers.insert(USER_AGENT, self.user_agent.clone());
            }
            None => {}
        }
        for name in [ACCEPT, ACCEPT_LANGUAGE] {
            if let Some(value) = inbound.get(&name) {
                headers.insert(name, value.clone());
            }
        }
        headers
    }
}

fn parse_target(target_url: &str) -> Result<Url, ProxyError> {
    let url = Url::parse(target_url)
        .map_err(|_| ProxyError::InvalidTarget("Invalid URL format".into()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProxyError::InvalidTarget(
            "Only HTTP and HTTPS protocols are supported".into(),
        ));
    }
    Ok(url)
}
