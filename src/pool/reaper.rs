//! Idle reaping and error reconciliation.
//!
//! # Responsibilities
//! - Periodically stop running sidecars nobody routed to within the idle window
//! - Mark running sidecars whose process exited as errored
//! - Return errored sidecars to `Stopped` after their cooldown
//! - Stop every running sidecar on shutdown

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::pool::lifecycle::{LifecycleManager, StopReason};
use crate::pool::sidecar::{LifecycleState, Sidecar};

pub struct Reaper {
    slots: Vec<Arc<Sidecar>>,
    lifecycle: LifecycleManager,
    idle_timeout: Duration,
    interval: Duration,
}

impl Reaper {
    pub fn new(
        slots: Vec<Arc<Sidecar>>,
        lifecycle: LifecycleManager,
        idle_timeout: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            slots,
            lifecycle,
            idle_timeout,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            idle_timeout_secs = self.idle_timeout.as_secs(),
            "Sidecar reaper starting"
        );

        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Sidecar reaper received shutdown signal, stopping sidecars");
                    self.stop_all().await;
                    break;
                }
            }
        }
    }

    /// One pass over the pool. Returns the number of sidecars stopped.
    pub async fn sweep(&self) -> usize {
        let mut stopped = 0;
        for sidecar in &self.slots {
            if sidecar.state() == LifecycleState::Running {
                if let Some(status) = sidecar.child_exited().await {
                    self.lifecycle
                        .fail(sidecar, &format!("process exited while running: {status}"))
                        .await;
                    continue;
                }
            }
            match sidecar.state() {
                LifecycleState::Running
                    if sidecar.in_flight() == 0 && sidecar.idle_for() >= self.idle_timeout =>
                {
                    tracing::debug!(
                        sidecar = %sidecar.id(),
                        idle_secs = sidecar.idle_for().as_secs(),
                        "Stopping idle sidecar"
                    );
                    if self.lifecycle.stop(sidecar, StopReason::Idle).await {
                        stopped += 1;
                    }
                }
                LifecycleState::Errored => {
                    self.lifecycle.reconcile(sidecar);
                }
                _ => {}
            }
        }
        stopped
    }

    pub async fn stop_all(&self) {
        for sidecar in &self.slots {
            self.lifecycle.stop(sidecar, StopReason::Shutdown).await;
        }
    }
}
