//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use searxng_edge::config::EdgeConfig;
use searxng_edge::http::HttpServer;
use searxng_edge::lifecycle::Shutdown;
use searxng_edge::pool::LocalPool;

/// A request as seen by the mock sidecar.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What the mock sidecar answers.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl Reply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

pub type Requests = Arc<Mutex<Vec<Recorded>>>;

async fn read_request(socket: &mut TcpStream) -> Option<Recorded> {
    let mut reader = BufReader::new(socket);
    let mut line = String::new();
    reader.read_line(&mut line).await.ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        if let Some((k, v)) = trimmed.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await.ok()?;

    Some(Recorded {
        method,
        target,
        headers,
        body,
    })
}

/// Start a mock sidecar on an ephemeral port.
///
/// Readiness probes (`GET /healthz`) are answered with 200 and not recorded;
/// every other request is recorded and answered by `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Requests)
where
    F: Fn(Recorded) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let recorded = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                let reply = if request.target == "/healthz" {
                    Reply::new(200, "ok")
                } else {
                    recorded.lock().unwrap().push(request.clone());
                    f(request).await
                };

                let mut response = format!(
                    "HTTP/1.1 {} Mock\r\nContent-Length: {}\r\nConnection: close\r\n",
                    reply.status,
                    reply.body.len()
                );
                for (name, value) in &reply.headers {
                    response.push_str(&format!("{name}: {value}\r\n"));
                }
                response.push_str("\r\n");
                response.push_str(&reply.body);

                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, requests)
}

/// Start a mock sidecar that always gives the same answer.
pub async fn start_mock_backend(reply: Reply) -> (SocketAddr, Requests) {
    start_programmable_backend(move |_| {
        let reply = reply.clone();
        async move { reply }
    })
    .await
}

/// Edge config with a single slot pointing at `backend`.
pub fn edge_config(backend: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.pool.capacity = 1;
    config.pool.window = 1;
    config.pool.host = backend.ip().to_string();
    config.pool.base_port = backend.port();
    config.pool.probe_interval_ms = 20;
    config.observability.metrics_enabled = false;
    config
}

/// Start the edge on an ephemeral port. Keep the returned `Shutdown` alive
/// for as long as the edge should serve.
pub async fn start_edge(config: EdgeConfig) -> (SocketAddr, Shutdown) {
    let pool = LocalPool::new(&config.pool).unwrap();
    let server = HttpServer::new(&config, Arc::new(pool));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}
