//! Tool-invocation surface (`/mcp`) against mock sidecars.

use std::net::SocketAddr;

use serde_json::{json, Value};

mod common;

use common::{edge_config, start_edge, start_mock_backend, Reply};

async fn rpc(edge: SocketAddr, message: Value) -> Value {
    let resp = reqwest::Client::new()
        .post(format!("http://{edge}/mcp"))
        .json(&message)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_initialize_and_list() {
    let (backend, _requests) = start_mock_backend(Reply::new(200, "{}")).await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;

    let init = rpc(
        edge,
        json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": { "protocolVersion": "2024-11-05" } }),
    )
    .await;
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(init["result"]["serverInfo"]["name"], "searxng-edge");

    let list = rpc(edge, json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" })).await;
    let tools = list["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "search");
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["q"]));
}

#[tokio::test]
async fn test_search_call_success() {
    let (backend, requests) = start_mock_backend(
        Reply::new(200, r#"{"query":"rust","results":[{"title":"Rust"}]}"#)
            .header("Server-Timing", "total;dur=12;desc=\"search\""),
    )
    .await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;

    let reply = rpc(
        edge,
        json!({
            "jsonrpc": "2.0",
            "id": "call-1",
            "method": "tools/call",
            "params": {
                "name": "search",
                "arguments": { "q": "rust", "categories": ["it"], "pageno": 2, "format": "html" },
            },
        }),
    )
    .await;

    let result = &reply["result"];
    assert_eq!(reply["id"], "call-1");
    assert_eq!(result["isError"], json!(false));
    assert_eq!(result["structuredContent"]["results"][0]["title"], "Rust");
    assert_eq!(result["_meta"]["timings"]["total (search)"], json!(12.0));
    let timings = &result["_meta"]["timings"];
    assert!(timings["edge-activate (sidecar selection)"].is_number(), "{timings}");
    assert!(timings["edge-upstream (sidecar response)"].is_number(), "{timings}");
    assert!(timings["edge-total (edge total)"].is_number(), "{timings}");
    assert!(result["content"][0]["text"].as_str().unwrap().contains("\"query\":\"rust\""));

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let target = &requests[0].target;
    assert!(target.starts_with("/search?q=rust"), "{target}");
    assert!(target.contains("categories=it"), "{target}");
    assert!(target.contains("pageno=2"), "{target}");
    assert!(target.contains("format=json"), "{target}");
    assert!(requests[0].header("x-request-id").is_some());
}

#[tokio::test]
async fn test_search_call_failure_summary() {
    let (backend, _requests) = start_mock_backend(Reply::new(500, "boom")).await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;

    let reply = rpc(
        edge,
        json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": { "name": "search", "arguments": { "q": "rust" } } }),
    )
    .await;
    assert_eq!(reply["result"]["isError"], json!(true));
    assert_eq!(reply["result"]["content"][0]["text"], "Search failed with status 500: boom");
}

#[tokio::test]
async fn test_search_call_invalid_arguments() {
    let (backend, requests) = start_mock_backend(Reply::new(200, "{}")).await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;

    let reply = rpc(
        edge,
        json!({ "jsonrpc": "2.0", "id": 4, "method": "tools/call",
                "params": { "name": "search", "arguments": { "q": "rust", "time_range": "decade" } } }),
    )
    .await;
    assert_eq!(reply["result"]["isError"], json!(true));
    assert!(reply["result"]["content"][0]["text"].as_str().unwrap().contains("time_range"));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_protocol_errors() {
    let (backend, _requests) = start_mock_backend(Reply::new(200, "{}")).await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;
    let client = reqwest::Client::new();

    let unknown = rpc(edge, json!({ "jsonrpc": "2.0", "id": 5, "method": "resources/list" })).await;
    assert_eq!(unknown["error"]["code"], -32601);

    let tool = rpc(
        edge,
        json!({ "jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": { "name": "fetch" } }),
    )
    .await;
    assert_eq!(tool["error"]["code"], -32602);

    let resp = client
        .post(format!("http://{edge}/mcp"))
        .body("{not json")
        .send()
        .await
        .unwrap();
    let parse: Value = resp.json().await.unwrap();
    assert_eq!(parse["error"]["code"], -32700);
    assert_eq!(parse["id"], Value::Null);

    let resp = client
        .post(format!("http://{edge}/mcp"))
        .json(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);

    let resp = client.get(format!("http://{edge}/mcp")).send().await.unwrap();
    assert_eq!(resp.status(), 405);
    assert_eq!(resp.headers()["allow"], "POST");
}
