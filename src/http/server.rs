//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: `/search`, `/mcp`, `/openapi.json`, catch-all proxy
//! - Wire up middleware (request ID, tracing, body limit)
//! - Bind to a listener and serve until shutdown

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderName,
    middleware,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::EdgeConfig;
use crate::http::openapi::openapi_handler;
use crate::http::proxy::proxy_handler;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::search::search_handler;
use crate::http::tool::tool_handler;
use crate::lifecycle::signalled;
use crate::pool::SidecarPool;
use crate::security::limits::{body_limit_middleware, BodyLimit};

/// Timing reconciliation settings resolved from config.
#[derive(Debug, Clone)]
pub struct TimingSettings {
    pub enabled: bool,
    /// Sidecar response headers harvested and stripped.
    pub inner_headers: Vec<HeaderName>,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<dyn SidecarPool>,
    pub timing: Arc<TimingSettings>,
    pub max_body_size: usize,
}

/// HTTP server for the edge.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &EdgeConfig, pool: Arc<dyn SidecarPool>) -> Self {
        let inner_headers = config
            .timing
            .inner_headers
            .iter()
            .filter_map(|name| match HeaderName::from_bytes(name.as_bytes()) {
                Ok(header) => Some(header),
                Err(e) => {
                    tracing::warn!(header = %name, error = %e, "Ignoring invalid timing header name");
                    None
                }
            })
            .collect();

        let state = AppState {
            pool,
            timing: Arc::new(TimingSettings {
                enabled: config.timing.enabled,
                inner_headers,
            }),
            max_body_size: config.security.max_body_size,
        };

        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let limit = BodyLimit(state.max_body_size);

        Router::new()
            .route("/search", any(search_handler))
            .route("/mcp", any(tool_handler))
            .route("/openapi.json", get(openapi_handler))
            .fallback(proxy_handler)
            .with_state(state)
            // The edge middleware enforces the limit; extractors must not impose their own.
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(middleware::from_fn_with_state(limit, body_limit_middleware)),
            )
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(signalled(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
