//! Sidecar pool management.
//!
//! # Responsibilities
//! - Expose the pool to the edge as one capability: `select_and_forward`
//! - Apply the selection policy over the configured candidate window
//! - Activate the chosen sidecar and forward the request verbatim

use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Response, Uri, Version};
use http_body::{Body as HttpBody, Frame, SizeHint};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::config::PoolConfig;
use crate::pool::error::PoolError;
use crate::pool::launch::Launcher;
use crate::pool::lifecycle::{LifecycleHooks, LifecycleManager, TracingHooks};
use crate::pool::probe::ReadinessProbe;
use crate::pool::reaper::Reaper;
use crate::pool::selector::{RandomWindow, Selector};
use crate::pool::sidecar::{ExchangeGuard, Sidecar, SidecarId};

/// Outcome of routing one request through the pool.
#[derive(Debug)]
pub struct Exchange {
    /// Sidecar that served the request.
    pub sidecar: SidecarId,
    /// Sidecar response, status and body untouched.
    pub response: Response<Body>,
    /// Time spent selecting and activating the sidecar.
    pub activation: Duration,
    /// Time until the sidecar's response head arrived.
    pub upstream: Duration,
}

/// The pool as seen by the edge.
#[async_trait]
pub trait SidecarPool: Send + Sync {
    /// Choose one sidecar, make sure it is running and forward `request` to it.
    ///
    /// Non-success statuses are returned as a normal `Exchange`; there is no
    /// retry against another sidecar.
    async fn select_and_forward(&self, request: Request<Body>) -> Result<Exchange, PoolError>;
}

/// Pool of fixed slots hosted by this process.
pub struct LocalPool {
    slots: Vec<Arc<Sidecar>>,
    window: usize,
    selector: Box<dyn Selector>,
    lifecycle: LifecycleManager,
    client: Client<HttpConnector, Body>,
    config: PoolConfig,
}

impl LocalPool {
    /// Build the pool with logging lifecycle hooks.
    pub fn new(config: &PoolConfig) -> Result<Self, PoolError> {
        Self::with_hooks(config, Arc::new(TracingHooks))
    }

    pub fn with_hooks(config: &PoolConfig, hooks: Arc<dyn LifecycleHooks>) -> Result<Self, PoolError> {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let slots = (0..config.capacity)
            .map(|slot| {
                let port = config.base_port as usize + slot;
                let authority = format!("{}:{}", config.host, port);
                Authority::from_str(&authority)
                    .map(|endpoint| Arc::new(Sidecar::new(slot, endpoint)))
                    .map_err(|e| PoolError::InvalidUri {
                        id: SidecarId::for_slot(slot),
                        reason: format!("{authority}: {e}"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let probe = ReadinessProbe::new(
            client.clone(),
            config.ready_path.clone(),
            Duration::from_secs(config.startup_timeout_secs.clamp(1, 5)),
        );
        let lifecycle = LifecycleManager::new(
            probe,
            config.launch.clone().map(Launcher::new),
            hooks,
            Duration::from_secs(config.startup_timeout_secs),
            Duration::from_millis(config.probe_interval_ms),
            Duration::from_secs(config.error_cooldown_secs),
        );

        tracing::info!(
            capacity = config.capacity,
            window = config.window,
            host = %config.host,
            base_port = config.base_port,
            launch = config.launch.is_some(),
            "Sidecar pool initialized"
        );

        Ok(Self {
            slots,
            window: config.window.min(config.capacity),
            selector: Box::new(RandomWindow::new()),
            lifecycle,
            client,
            config: config.clone(),
        })
    }

    pub fn slots(&self) -> &[Arc<Sidecar>] {
        &self.slots
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Background task stopping idle sidecars and reconciling errored ones.
    pub fn reaper(&self) -> Reaper {
        Reaper::new(
            self.slots.clone(),
            self.lifecycle.clone(),
            Duration::from_secs(self.config.idle_timeout_secs),
            Duration::from_secs(self.config.reap_interval_secs),
        )
    }

    fn target_uri(sidecar: &Sidecar, uri: &Uri) -> Result<Uri, PoolError> {
        let mut parts = uri.clone().into_parts();
        parts.scheme = Some(Scheme::HTTP);
        parts.authority = Some(sidecar.endpoint().clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        Uri::from_parts(parts).map_err(|e| PoolError::InvalidUri {
            id: sidecar.id().clone(),
            reason: e.to_string(),
        })
    }
}

/// Response body that keeps its exchange in flight until it is consumed or dropped.
#[derive(Debug)]
struct GuardedBody {
    inner: Body,
    _guard: ExchangeGuard,
}

impl HttpBody for GuardedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.inner).poll_frame(cx)
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }
}

#[async_trait]
impl SidecarPool for LocalPool {
    async fn select_and_forward(&self, request: Request<Body>) -> Result<Exchange, PoolError> {
        let started = Instant::now();

        let sidecar = self
            .selector
            .select(&self.slots, self.window)
            .ok_or(PoolError::NoCandidates { window: self.window })?;
        tracing::debug!(sidecar = %sidecar.id(), state = %sidecar.state(), "Sidecar selected");

        self.lifecycle.activate(&sidecar).await?;
        let activation = started.elapsed();

        let (mut parts, body) = request.into_parts();
        parts.uri = Self::target_uri(&sidecar, &parts.uri)?;
        // Sidecars speak HTTP/1.1 regardless of how the client reached the edge.
        parts.version = Version::HTTP_11;
        let request = Request::from_parts(parts, body);

        let guard = sidecar.begin_exchange();
        let upstream_started = Instant::now();
        let response = self
            .client
            .request(request)
            .await
            .map_err(|source| PoolError::Upstream {
                id: guard.id().clone(),
                source,
            })?;
        let upstream = upstream_started.elapsed();

        let (parts, body) = response.into_parts();
        let body = GuardedBody {
            inner: Body::new(body),
            _guard: guard,
        };
        Ok(Exchange {
            sidecar: sidecar.id().clone(),
            response: Response::from_parts(parts, Body::new(body)),
            activation,
            upstream,
        })
    }
}
