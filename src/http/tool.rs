//! Tool-invocation surface (`/mcp`, JSON-RPC 2.0).
//!
//! Exposes one tool, `search`, whose arguments are the search query fields.
//! A call is flattened into wire pairs, decoded with the same codec as
//! `/search`, re-encoded and forwarded through the pool as `GET /search`.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::openapi::arguments_schema;
use crate::http::proxy::forward;
use crate::http::request::X_REQUEST_ID;
use crate::http::server::AppState;
use crate::query::{decode, to_query_string};
use crate::timing::metrics_map;

pub const PROTOCOL_VERSION: &str = "2025-03-26";
pub const SEARCH_TOOL: &str = "search";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: serde_json::Map<String, Value>,
}

fn rpc_result(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn rpc_error(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

fn tool_failure(text: String) -> Value {
    json!({ "content": [{ "type": "text", "text": text }], "isError": true })
}

/// Flatten JSON arguments into the wire pairs the codec understands.
/// Arrays become comma separated lists; nulls are treated as absent.
pub fn arguments_to_pairs(arguments: &serde_json::Map<String, Value>) -> Vec<(String, String)> {
    arguments
        .iter()
        .filter_map(|(name, value)| {
            let wire = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(","),
                Value::Object(_) => value.to_string(),
            };
            Some((name.clone(), wire))
        })
        .collect()
}

pub async fn tool_handler(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "POST")],
            "Streaming transport not supported; POST JSON-RPC messages",
        )
            .into_response();
    }

    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "Unparsable tool message");
            return Json(rpc_error(Value::Null, PARSE_ERROR, "Parse error")).into_response();
        }
    };
    let request: RpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(_) => {
            return Json(rpc_error(Value::Null, INVALID_REQUEST, "Invalid Request")).into_response()
        }
    };
    if request.jsonrpc != "2.0" {
        let id = request.id.unwrap_or(Value::Null);
        return Json(rpc_error(id, INVALID_REQUEST, "Invalid Request")).into_response();
    }

    // Notifications get no response body.
    let Some(id) = request.id else {
        tracing::debug!(method = %request.method, "Tool notification received");
        return StatusCode::ACCEPTED.into_response();
    };

    let reply = match request.method.as_str() {
        "initialize" => {
            let version = request
                .params
                .get("protocolVersion")
                .and_then(Value::as_str)
                .unwrap_or(PROTOCOL_VERSION);
            rpc_result(
                id,
                json!({
                    "protocolVersion": version,
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": { "name": "searxng-edge", "version": env!("CARGO_PKG_VERSION") },
                }),
            )
        }
        "ping" => rpc_result(id, json!({})),
        "tools/list" => rpc_result(
            id,
            json!({
                "tools": [{
                    "name": SEARCH_TOOL,
                    "description": "Search the web through a pool of SearXNG instances.",
                    "inputSchema": arguments_schema(),
                }],
            }),
        ),
        "tools/call" => match serde_json::from_value::<CallParams>(request.params) {
            Ok(call) if call.name == SEARCH_TOOL => {
                rpc_result(id, call_search(&state, &call.arguments).await)
            }
            Ok(call) => rpc_error(id, INVALID_PARAMS, &format!("Unknown tool: {}", call.name)),
            Err(e) => rpc_error(id, INVALID_PARAMS, &format!("Invalid params: {e}")),
        },
        other => {
            tracing::debug!(method = %other, "Unknown tool method");
            rpc_error(id, METHOD_NOT_FOUND, "Method not found")
        }
    };
    Json(reply).into_response()
}

async fn call_search(state: &AppState, arguments: &serde_json::Map<String, Value>) -> Value {
    let mut pairs = arguments_to_pairs(arguments);
    pairs.retain(|(name, _)| name != "format");
    pairs.push(("format".to_string(), "json".to_string()));

    let params = match decode(&pairs) {
        Ok(params) => params,
        Err(e) => return tool_failure(format!("Invalid search arguments: {e}")),
    };

    let request_id = uuid::Uuid::new_v4().to_string();
    let request = match Request::builder()
        .method(Method::GET)
        .uri(format!("/search?{}", to_query_string(&params)))
        .header(header::ACCEPT, "application/json")
        .header(X_REQUEST_ID, &request_id)
        .body(Body::empty())
    {
        Ok(request) => request,
        Err(e) => return tool_failure(format!("Search failed: {e}")),
    };

    let forwarded = match forward(state, request).await {
        Ok(forwarded) => forwarded,
        Err(e) => {
            return tool_failure(format!(
                "Search failed with status {}: {e}",
                e.status().as_u16()
            ))
        }
    };

    let status = forwarded.response.status();
    let body = match axum::body::to_bytes(forwarded.response.into_body(), state.max_body_size).await {
        Ok(body) => String::from_utf8_lossy(&body).into_owned(),
        Err(e) => return tool_failure(format!("Search failed reading response: {e}")),
    };

    if !status.is_success() {
        return tool_failure(format!("Search failed with status {}: {}", status.as_u16(), body));
    }

    let mut result = json!({
        "content": [{ "type": "text", "text": body }],
        "isError": false,
        "_meta": {
            "sidecar": forwarded.sidecar.as_str(),
            "timings": metrics_map(&forwarded.timings),
        },
    });
    if let Ok(structured @ Value::Object(_)) = serde_json::from_str::<Value>(&body) {
        result["structuredContent"] = structured;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_flatten() {
        let arguments = json!({
            "q": "rust",
            "categories": ["it", "news"],
            "pageno": 2,
            "image_proxy": true,
            "time_range": null,
        });
        let mut pairs = arguments_to_pairs(arguments.as_object().unwrap());
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("categories".to_string(), "it,news".to_string()),
                ("image_proxy".to_string(), "true".to_string()),
                ("pageno".to_string(), "2".to_string()),
                ("q".to_string(), "rust".to_string()),
            ]
        );

        let params = decode(&pairs).unwrap();
        assert_eq!(params.categories, vec!["it", "news"]);
        assert_eq!(params.pageno, 2);
        assert!(params.image_proxy);
    }

    #[test]
    fn test_rpc_shapes() {
        assert_eq!(
            rpc_error(json!(7), METHOD_NOT_FOUND, "Method not found"),
            json!({ "jsonrpc": "2.0", "id": 7, "error": { "code": -32601, "message": "Method not found" } })
        );
        assert_eq!(tool_failure("boom".into())["isError"], json!(true));
    }
}
