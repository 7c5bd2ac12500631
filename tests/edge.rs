//! End-to-end tests of the edge against mock sidecars.

use std::time::Duration;

use serde_json::{json, Value};

mod common;

use common::{edge_config, start_edge, start_mock_backend, start_programmable_backend, Reply};

#[tokio::test]
async fn test_upstream_error_passes_through() {
    let (backend, requests) = start_mock_backend(Reply::new(502, "sidecar broke")).await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;

    let resp = reqwest::get(format!("http://{edge}/stats")).await.unwrap();
    assert_eq!(resp.status(), 502);
    assert_eq!(resp.text().await.unwrap(), "sidecar broke");
    // No failover: exactly one attempt reached a sidecar.
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_not_found_passes_through() {
    let (backend, requests) = start_mock_backend(Reply::new(404, "nope")).await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;

    let resp = reqwest::get(format!("http://{edge}/missing/page?x=1")).await.unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.text().await.unwrap(), "nope");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].target, "/missing/page?x=1");
}

#[tokio::test]
async fn test_body_limit_boundary() {
    let (backend, requests) = start_mock_backend(Reply::new(200, "stored")).await;
    let mut config = edge_config(backend);
    config.security.max_body_size = 16;
    let (edge, _shutdown) = start_edge(config).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{edge}/upload"))
        .body(vec![b'a'; 16])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(requests.lock().unwrap()[0].body, vec![b'a'; 16]);

    let resp = client
        .post(format!("http://{edge}/upload"))
        .body(vec![b'a'; 17])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "success": false,
            "errors": [{ "message": "Content size not supported", "extensions": { "code": 413 } }],
        })
    );
    assert_eq!(requests.lock().unwrap().len(), 1);
}

fn chunked(total: usize) -> reqwest::Body {
    let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
        vec![b'a'; total].chunks(5).map(|c| Ok(c.to_vec())).collect();
    reqwest::Body::wrap_stream(futures_util::stream::iter(chunks))
}

#[tokio::test]
async fn test_body_limit_boundary_without_content_length() {
    let (backend, requests) = start_mock_backend(Reply::new(200, "stored")).await;
    let mut config = edge_config(backend);
    config.security.max_body_size = 16;
    let (edge, _shutdown) = start_edge(config).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{edge}/upload"))
        .body(chunked(16))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    {
        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].body, vec![b'a'; 16]);
        assert_eq!(requests[0].header("content-length"), Some("16"));
        assert!(requests[0].header("transfer-encoding").is_none());
    }

    let resp = client
        .post(format!("http://{edge}/upload"))
        .body(chunked(17))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["message"], "Content size not supported");
    assert_eq!(body["errors"][0]["extensions"]["code"], 413);
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_server_timing_merged_into_one_header() {
    let (backend, _requests) = start_mock_backend(
        Reply::new(200, "{}")
            .header("Server-Timing", "db;dur=5.5;desc=\"query\"")
            .header("X-Sidecar-Server-Timing", "render;dur=2, cache"),
    )
    .await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;

    let resp = reqwest::get(format!("http://{edge}/search?q=rust")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let timings: Vec<_> = resp.headers().get_all("server-timing").iter().collect();
    assert_eq!(timings.len(), 1);
    let timing = timings[0].to_str().unwrap();
    assert!(timing.starts_with("db;dur=5.5;desc=\"query\", render;dur=2"), "{timing}");
    assert!(timing.contains("edge-activate;dur="), "{timing}");
    assert!(timing.contains("edge-total;dur="), "{timing}");
    assert!(!timing.contains("cache"), "{timing}");
    assert!(resp.headers().get("x-sidecar-server-timing").is_none());
}

#[tokio::test]
async fn test_timing_disabled_leaves_headers_alone() {
    let (backend, _requests) =
        start_mock_backend(Reply::new(200, "{}").header("X-Sidecar-Server-Timing", "render;dur=2"))
            .await;
    let mut config = edge_config(backend);
    config.timing.enabled = false;
    let (edge, _shutdown) = start_edge(config).await;

    let resp = reqwest::get(format!("http://{edge}/")).await.unwrap();
    assert_eq!(resp.headers()["x-sidecar-server-timing"], "render;dur=2");
    assert!(resp.headers().get("server-timing").is_none());
}

#[tokio::test]
async fn test_search_rejects_invalid_query_without_contacting_sidecar() {
    let (backend, requests) = start_mock_backend(Reply::new(200, "{}")).await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;

    let resp = reqwest::get(format!("http://{edge}/search?q=rust&pageno=0")).await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["errors"][0]["extensions"]["field"], "pageno");
    assert_eq!(body["errors"][0]["extensions"]["code"], 400);

    let resp = reqwest::get(format!("http://{edge}/search?pageno=2")).await.unwrap();
    assert_eq!(resp.status(), 400);

    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_forwards_query_verbatim() {
    let (backend, requests) = start_mock_backend(Reply::new(200, "{\"results\":[]}")).await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;

    let resp = reqwest::get(format!("http://{edge}/search?q=rust+lang&categories=it,news&format=json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "{\"results\":[]}");

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].target, "/search?q=rust+lang&categories=it,news&format=json");
}

#[tokio::test]
async fn test_search_form_post_is_validated_and_forwarded() {
    let (backend, requests) = start_mock_backend(Reply::new(200, "{\"results\":[]}")).await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{edge}/search"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("q=rust&categories=general")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    {
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].target, "/search");
        assert_eq!(requests[0].body, b"q=rust&categories=general".to_vec());
    }

    let resp = client
        .post(format!("http://{edge}/search"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("q=rust&pageno=0")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["extensions"]["field"], "pageno");
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_request_id_reaches_sidecar_and_client() {
    let (backend, requests) = start_mock_backend(Reply::new(200, "ok")).await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("http://{edge}/")).send().await.unwrap();
    let generated = resp.headers()["x-request-id"].to_str().unwrap().to_string();
    assert_eq!(generated.len(), 36);
    assert_eq!(requests.lock().unwrap()[0].header("x-request-id"), Some(generated.as_str()));

    let resp = client
        .get(format!("http://{edge}/"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "abc-123");
    assert_eq!(requests.lock().unwrap()[1].header("x-request-id"), Some("abc-123"));
}

#[tokio::test]
async fn test_unreachable_sidecar_is_bad_gateway() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let mut config = edge_config(dead);
    config.pool.startup_timeout_secs = 1;
    let (edge, _shutdown) = start_edge(config).await;

    let resp = tokio::time::timeout(
        Duration::from_secs(5),
        reqwest::get(format!("http://{edge}/search?q=rust")),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(resp.status(), 502);
    assert!(resp.text().await.unwrap().starts_with("Upstream request failed"));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_sidecar() {
    let (backend, requests) = start_programmable_backend(|request| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Reply::new(200, request.target)
    })
    .await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;
    let client = reqwest::Client::new();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let resp = client.get(format!("http://{edge}/page/{i}")).send().await.unwrap();
                resp.text().await.unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), format!("/page/{i}"));
    }
    assert_eq!(requests.lock().unwrap().len(), 10);
}

#[tokio::test]
async fn test_openapi_document() {
    let (backend, requests) = start_mock_backend(Reply::new(200, "ok")).await;
    let (edge, _shutdown) = start_edge(edge_config(backend)).await;

    let resp = reqwest::get(format!("http://{edge}/openapi.json")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let doc: Value = resp.json().await.unwrap();
    assert_eq!(doc["openapi"], "3.1.0");
    assert!(doc["paths"]["/search"]["get"]["parameters"].is_array());
    assert!(requests.lock().unwrap().is_empty());
}
