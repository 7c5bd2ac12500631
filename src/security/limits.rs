//! Request body size limit.
//!
//! # Responsibilities
//! - Reject declared bodies above the limit before reading them
//! - Buffer undeclared (chunked) bodies up to the limit, reject beyond it,
//!   and forward what was buffered with a Content-Length
//! - Answer with the structured 413 payload
//!
//! # Design Decisions
//! - A body of exactly the limit is accepted
//! - Declared lengths are trusted; hyper enforces the framing
//! - Rejection happens before any sidecar is selected or started

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{
        header::{CONTENT_LENGTH, TRANSFER_ENCODING},
        HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::EdgeError;
use crate::observability::metrics;

/// Maximum accepted request body, in bytes.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

fn reject(limit: usize, declared: Option<u64>) -> Response {
    tracing::warn!(limit, declared = ?declared, "Request body too large");
    metrics::record_payload_rejected();
    EdgeError::PayloadTooLarge { limit }.into_response()
}

/// Middleware enforcing [`BodyLimit`].
pub async fn body_limit_middleware(
    State(BodyLimit(limit)): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Response {
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match declared {
        Some(length) if length > limit as u64 => reject(limit, declared),
        Some(_) => next.run(request).await,
        None if request.body().is_end_stream() => next.run(request).await,
        None => {
            let (mut parts, body) = request.into_parts();
            match axum::body::to_bytes(body, limit).await {
                Ok(bytes) => {
                    parts.headers.remove(TRANSFER_ENCODING);
                    parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
                    next.run(Request::from_parts(parts, Body::from(bytes))).await
                }
                Err(_) => reject(limit, None),
            }
        }
    }
}
