//! Readiness probing for starting sidecars.

use std::time::Duration;

use axum::body::Body;
use axum::http::{uri::Authority, Request};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use tokio::time;

/// Issues `GET <ready_path>` against a sidecar endpoint.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    client: Client<HttpConnector, Body>,
    path: String,
    attempt_timeout: Duration,
}

impl ReadinessProbe {
    pub fn new(client: Client<HttpConnector, Body>, path: impl Into<String>, attempt_timeout: Duration) -> Self {
        Self {
            client,
            path: path.into(),
            attempt_timeout,
        }
    }

    /// One probe attempt. `Ok(())` on any 2xx, otherwise a description of the failure.
    pub async fn check(&self, endpoint: &Authority) -> Result<(), String> {
        let request = Request::builder()
            .method("GET")
            .uri(format!("http://{}{}", endpoint, self.path))
            .header("user-agent", "searxng-edge-readiness")
            .body(Body::empty())
            .map_err(|e| format!("failed to build readiness request: {e}"))?;

        match time::timeout(self.attempt_timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => Err(format!("readiness returned {}", response.status())),
            Ok(Err(e)) => Err(format!("readiness connection error: {e}")),
            Err(_) => Err("readiness probe timed out".to_string()),
        }
    }
}
