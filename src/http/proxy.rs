//! Edge orchestration shared by every route: pool exchange, telemetry merge, metrics.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
};

use crate::http::error::EdgeError;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::pool::SidecarId;
use crate::timing::{apply_to_response, EdgeTimer, TimingMetric};

/// A response obtained from a sidecar, ready to leave the edge.
#[derive(Debug)]
pub struct Forwarded {
    pub sidecar: SidecarId,
    pub response: Response,
    /// Merged sidecar and edge metrics, markers included.
    pub timings: Vec<TimingMetric>,
}

/// Send `request` through the pool and reconcile timing headers on the way back.
pub async fn forward(state: &AppState, request: Request<Body>) -> Result<Forwarded, EdgeError> {
    let start = Instant::now();
    let mut timer = EdgeTimer::start();
    let request_id = request_id(request.headers());
    let method = request.method().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        "Forwarding request"
    );

    let exchange = match state.pool.select_and_forward(request).await {
        Ok(exchange) => exchange,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Sidecar exchange failed");
            metrics::record_request(&method, 502, "none", start);
            return Err(e.into());
        }
    };

    timer.record("edge-activate", "sidecar selection", exchange.activation);
    timer.record("edge-upstream", "sidecar response", exchange.upstream);

    let mut response = exchange.response;
    let timings = if state.timing.enabled {
        apply_to_response(response.headers_mut(), &state.timing.inner_headers, timer.finish())
    } else {
        Vec::new()
    };

    let status = response.status();
    if !status.is_success() {
        tracing::info!(
            request_id = %request_id,
            sidecar = %exchange.sidecar,
            status = %status,
            "Sidecar answered with non-success status"
        );
    }
    metrics::record_request(&method, status.as_u16(), exchange.sidecar.as_str(), start);

    Ok(Forwarded {
        sidecar: exchange.sidecar,
        response,
        timings,
    })
}

/// Catch-all handler: every method, every path, forwarded verbatim.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    match forward(&state, request).await {
        Ok(forwarded) => forwarded.response,
        Err(e) => e.into_response(),
    }
}
