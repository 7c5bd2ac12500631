//! Documented search API: validate the query, then forward the request as received.
//!
//! SearXNG accepts parameters both in the query string and in an urlencoded
//! form body, so a form POST is validated on the union of both.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Method, Request},
    response::{IntoResponse, Response},
};
use url::form_urlencoded;

use crate::http::error::EdgeError;
use crate::http::proxy::forward;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::query::{decode, SearchParams, ValidationError};

fn is_form(method: &Method, headers: &HeaderMap) -> bool {
    method != Method::GET
        && method != Method::HEAD
        && headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| {
                v.trim_start()
                    .to_ascii_lowercase()
                    .starts_with("application/x-www-form-urlencoded")
            })
}

/// Decode query string pairs followed by form pairs; later pairs win for scalars.
fn decode_search(query: Option<&str>, form: Option<&[u8]>) -> Result<SearchParams, ValidationError> {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .into_owned()
        .collect();
    if let Some(form) = form {
        pairs.extend(form_urlencoded::parse(form).into_owned());
    }
    decode(&pairs)
}

pub async fn search_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    if !is_form(request.method(), request.headers()) {
        return validate_and_forward(&state, request, None).await;
    }

    let (parts, body) = request.into_parts();
    let bytes: Bytes = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return EdgeError::PayloadTooLarge {
                limit: state.max_body_size,
            }
            .into_response()
        }
    };
    let request = Request::from_parts(parts, Body::from(bytes.clone()));
    validate_and_forward(&state, request, Some(bytes.as_ref())).await
}

async fn validate_and_forward(state: &AppState, request: Request<Body>, form: Option<&[u8]>) -> Response {
    match decode_search(request.uri().query(), form) {
        Ok(params) => {
            tracing::debug!(
                request_id = %request_id(request.headers()),
                q = %params.q,
                pageno = params.pageno,
                categories = ?params.categories,
                form = form.is_some(),
                "Search query accepted"
            );
        }
        Err(e) => {
            tracing::info!(
                request_id = %request_id(request.headers()),
                field = e.field,
                error = %e,
                "Rejecting search query"
            );
            return EdgeError::from(e).into_response();
        }
    }

    match forward(state, request).await {
        Ok(forwarded) => forwarded.response,
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn form_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
        );
        headers
    }

    #[test]
    fn test_form_detection() {
        assert!(is_form(&Method::POST, &form_headers()));
        assert!(!is_form(&Method::GET, &form_headers()));
        assert!(!is_form(&Method::POST, &HeaderMap::new()));
    }

    #[test]
    fn test_form_pairs_follow_query_pairs() {
        let params = decode_search(Some("q=old&pageno=3"), Some(b"q=rust&categories=it".as_slice())).unwrap();
        assert_eq!(params.q, "rust");
        assert_eq!(params.pageno, 3);
        assert_eq!(params.categories, vec!["it".to_string()]);

        let params = decode_search(None, Some(b"q=rust+lang".as_slice())).unwrap();
        assert_eq!(params.q, "rust lang");

        let err = decode_search(None, Some(b"q=rust&pageno=0".as_slice())).unwrap_err();
        assert_eq!(err.field, "pageno");
        assert_eq!(decode_search(None, Some(b"".as_slice())).unwrap_err().field, "q");
    }
}
