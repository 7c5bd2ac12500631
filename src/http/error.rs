use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use crate::pool::PoolError;
use crate::query::ValidationError;

/// Message of the structured 413 payload.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Content size not supported";

/// Errors the edge answers itself.
#[derive(Error, Debug)]
pub enum EdgeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl EdgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            EdgeError::Validation(_) => StatusCode::BAD_REQUEST,
            EdgeError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            EdgeError::Pool(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// `{"success": false, "errors": [{"message": ..., "extensions": {...}}]}`
pub fn failure_envelope(message: &str, extensions: Value) -> Value {
    json!({
        "success": false,
        "errors": [{ "message": message, "extensions": extensions }],
    })
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            EdgeError::Validation(e) => {
                let body = failure_envelope(
                    &e.to_string(),
                    json!({ "code": status.as_u16(), "field": e.field }),
                );
                (status, Json(body)).into_response()
            }
            EdgeError::PayloadTooLarge { .. } => {
                let body = failure_envelope(
                    PAYLOAD_TOO_LARGE_MESSAGE,
                    json!({ "code": status.as_u16() }),
                );
                (status, Json(body)).into_response()
            }
            EdgeError::Pool(e) => {
                tracing::warn!(error = %e, "Sidecar exchange failed");
                (status, format!("Upstream request failed: {e}")).into_response()
            }
        }
    }
}
