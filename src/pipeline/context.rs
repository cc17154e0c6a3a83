//! Per-request state shared by the processors of one pipeline run.
//!
//! Both contexts are created by the proxy service for a single inbound call
//! and dropped once the reply is built.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::ProxyError;

/// Why a pipeline stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Missing, malformed or non-http(s) target URL.
    InvalidTarget,
    /// Missing or unknown token.
    Unauthorized,
    /// A response processor decided the body must not be returned.
    Suppressed,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortReason::InvalidTarget => "invalid_target",
            AbortReason::Unauthorized => "unauthorized",
            AbortReason::Suppressed => "suppressed",
        }
    }
}

/// Implemented by every context a pipeline can run over.
pub trait PipelineContext: Send {
    fn abort_reason(&self) -> Option<AbortReason>;

    fn is_aborted(&self) -> bool {
        self.abort_reason().is_some()
    }
}

/// The outbound request under construction. Always a GET.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// `None` while the target URL does not parse.
    pub url: Option<Url>,
    pub headers: HeaderMap,
}

impl OutboundRequest {
    pub fn get(target_url: &str) -> Self {
        Self {
            method: Method::GET,
            url: Url::parse(target_url).ok(),
            headers: HeaderMap::new(),
        }
    }
}

/// Request-side pipeline context.
#[derive(Debug)]
pub struct RequestContext {
    /// Headers of the inbound request.
    pub inbound_headers: HeaderMap,
    pub target_url: String,
    /// Caller-supplied token; replaced by the resolved token on authorization.
    pub token: Option<String>,
    pub outbound: OutboundRequest,
    /// Free-form data passed between processors.
    pub properties: HashMap<String, Value>,
    abort: Option<AbortReason>,
}

impl RequestContext {
    pub fn new(inbound_headers: HeaderMap, target_url: impl Into<String>, token: Option<String>) -> Self {
        let target_url = target_url.into();
        let outbound = OutboundRequest::get(&target_url);
        Self {
            inbound_headers,
            target_url,
            token: token.filter(|t| !t.is_empty()),
            outbound,
            properties: HashMap::new(),
            abort: None,
        }
    }

    /// Stop the request pipeline; the outbound fetch will not happen.
    pub fn abort(&mut self, reason: AbortReason) {
        self.abort = Some(reason);
    }
}

impl PipelineContext for RequestContext {
    fn abort_reason(&self) -> Option<AbortReason> {
        self.abort
    }
}

/// How the upstream body is held once classified.
#[derive(Debug, Default)]
pub enum ResponseBody {
    /// Classification has not run; the body is still in the upstream handle.
    #[default]
    Unclassified,
    /// Decoded text plus the bytes it was decoded from.
    Text { text: String, raw: Bytes },
    /// Opaque body, streamed from the upstream response as-is.
    Stream(reqwest::Response),
}

/// Response-side pipeline context.
#[derive(Debug)]
pub struct ResponseContext {
    pub target_url: String,
    pub token: Option<String>,
    pub status: StatusCode,
    /// Headers of the upstream response, captured before the body is taken.
    pub upstream_headers: HeaderMap,
    /// Upstream handle; taken by classification.
    pub upstream: Option<reqwest::Response>,
    /// Upstream media type (no parameters), lowercase.
    pub content_type: Option<String>,
    pub body: ResponseBody,
    /// Set by a rewriter that changed the text; the text is then authoritative.
    pub content_modified: bool,
    /// Headers added to the reply.
    pub reply_headers: HeaderMap,
    pub properties: HashMap<String, Value>,
    abort: Option<AbortReason>,
}

impl ResponseContext {
    pub fn new(target_url: impl Into<String>, token: Option<String>, upstream: reqwest::Response) -> Self {
        let upstream_headers = upstream.headers().clone();
        let content_type = media_type(&upstream_headers);
        Self {
            target_url: target_url.into(),
            token,
            status: upstream.status(),
            upstream_headers,
            upstream: Some(upstream),
            content_type,
            body: ResponseBody::Unclassified,
            content_modified: false,
            reply_headers: HeaderMap::new(),
            properties: HashMap::new(),
            abort: None,
        }
    }

    pub fn abort(&mut self, reason: AbortReason) {
        self.abort = Some(reason);
    }

    /// Whether the classified content type contains `needle`.
    pub fn content_type_contains(&self, needle: &str) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains(needle))
    }

    /// The decoded text, when classified as text and non-empty.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Text { text, .. } if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    /// Replace the text body with a rewritten version.
    pub fn set_text(&mut self, rewritten: String) {
        if let ResponseBody::Text { text, .. } = &mut self.body {
            *text = rewritten;
            self.content_modified = true;
        }
    }

    /// Read the whole upstream body. Fails if classification already took it.
    pub async fn take_body_bytes(&mut self) -> Result<Bytes, ProxyError> {
        let upstream = self
            .upstream
            .take()
            .ok_or_else(|| ProxyError::Internal("upstream body already consumed".into()))?;
        let status = self.status;
        upstream
            .bytes()
            .await
            .map_err(|source| ProxyError::UpstreamBody { status, source })
    }
}

#[cfg(test)]
impl ResponseContext {
    /// Context over an in-memory upstream response.
    pub(crate) fn for_test(target_url: &str, content_type: Option<&str>, body: &[u8]) -> Self {
        let mut builder = axum::http::Response::builder().status(StatusCode::OK);
        if let Some(ct) = content_type {
            builder = builder.header(axum::http::header::CONTENT_TYPE, ct);
        }
        let upstream = reqwest::Response::from(builder.body(body.to_vec()).unwrap());
        Self::new(target_url, Some("K".to_string()), upstream)
    }
}

impl PipelineContext for ResponseContext {
    fn abort_reason(&self) -> Option<AbortReason> {
        self.abort
    }
}

/// Media type of a `Content-Type` header, parameters stripped, lowercase.
fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get(axum::http::header::CONTENT_TYPE)?
        .to_str()
        .ok()?;
    let media = value.split(';').next()?.trim();
    (!media.is_empty()).then(|| media.to_ascii_lowercase())
}
