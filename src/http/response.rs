//! Reply assembly.
//!
//! # Responsibilities
//! - Turn a finished `ResponseContext` into the client reply
//! - Pick the body source: rewritten text, classified bytes, or upstream stream
//! - Tag every reply with a content type
//!
//! # Design Decisions
//! - Opaque bodies stream without buffering
//! - Unmodified text is returned as the exact upstream bytes
//! - Rewritten text is re-encoded as UTF-8 and labelled so

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::pipeline::{ResponseBody, ResponseContext};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Stream a `reqwest` response body into an axum body.
pub fn stream_body(upstream: reqwest::Response) -> Body {
    Body::from_stream(upstream.bytes_stream())
}

/// Reply for a response pipeline that aborted: upstream status, empty body.
pub fn aborted_reply(status: StatusCode) -> Response {
    status.into_response()
}

/// Build the reply from a completed response pipeline.
pub fn assemble_reply(ctx: ResponseContext) -> Response {
    let upstream_type = ctx.upstream_headers.get(CONTENT_TYPE).cloned();

    let (body, content_type) = match ctx.body {
        ResponseBody::Text { text, .. } if ctx.content_modified => {
            let media = ctx.content_type.as_deref().unwrap_or("text/plain");
            let content_type = HeaderValue::from_str(&format!("{media}; charset=utf-8")).ok();
            (Body::from(text), content_type)
        }
        ResponseBody::Text { raw, .. } => (Body::from(raw), upstream_type),
        ResponseBody::Stream(upstream) => (stream_body(upstream), upstream_type),
        ResponseBody::Unclassified => match ctx.upstream {
            Some(upstream) => (stream_body(upstream), upstream_type),
            None => (Body::empty(), upstream_type),
        },
    };

    let mut response = Response::new(body);
    *response.status_mut() = ctx.status;
    let headers = response.headers_mut();
    headers.extend(ctx.reply_headers);
    headers.insert(
        CONTENT_TYPE,
        content_type.unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
    );
    response
}
