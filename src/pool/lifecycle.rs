//! Sidecar lifecycle state machine.
//!
//! # States
//! ```text
//! Stopped → Starting → Running → Stopping → Stopped
//!              │          │
//!              └────┬─────┘
//!                   ▼
//!                Errored ──(cooldown, reconcile)──→ Stopped
//! ```
//!
//! # Design Decisions
//! - Exactly one caller wins `Stopped → Starting`; the start runs on its own
//!   task so a disconnecting caller cannot abandon a half-started sidecar
//! - Callers wait on the state channel for `Running` or `Errored`
//! - Hooks fire on the winning transition only, so once per (de)activation

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time;

use crate::pool::error::PoolError;
use crate::pool::launch::Launcher;
use crate::pool::probe::ReadinessProbe;
use crate::pool::sidecar::{LifecycleState, Sidecar};

/// Why a sidecar was deactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Idle,
    Shutdown,
}

/// Diagnostic callbacks on lifecycle edges. They must not affect routing.
pub trait LifecycleHooks: Send + Sync {
    fn on_start(&self, sidecar: &Sidecar, warmup: Duration);
    fn on_stop(&self, sidecar: &Sidecar, reason: StopReason);
    fn on_error(&self, sidecar: &Sidecar, detail: &str);
}

/// Hooks that log each edge.
#[derive(Debug, Default)]
pub struct TracingHooks;

impl LifecycleHooks for TracingHooks {
    fn on_start(&self, sidecar: &Sidecar, warmup: Duration) {
        tracing::info!(
            sidecar = %sidecar.id(),
            endpoint = %sidecar.endpoint(),
            warmup_ms = warmup.as_millis() as u64,
            "Sidecar started"
        );
    }

    fn on_stop(&self, sidecar: &Sidecar, reason: StopReason) {
        tracing::info!(sidecar = %sidecar.id(), reason = ?reason, "Sidecar stopped");
    }

    fn on_error(&self, sidecar: &Sidecar, detail: &str) {
        tracing::error!(sidecar = %sidecar.id(), error = %detail, "Sidecar errored");
    }
}

/// Drives sidecars through their lifecycle.
#[derive(Clone)]
pub struct LifecycleManager {
    probe: ReadinessProbe,
    launcher: Option<Launcher>,
    hooks: Arc<dyn LifecycleHooks>,
    startup_timeout: Duration,
    probe_interval: Duration,
    error_cooldown: Duration,
}

impl LifecycleManager {
    pub fn new(
        probe: ReadinessProbe,
        launcher: Option<Launcher>,
        hooks: Arc<dyn LifecycleHooks>,
        startup_timeout: Duration,
        probe_interval: Duration,
        error_cooldown: Duration,
    ) -> Self {
        Self {
            probe,
            launcher,
            hooks,
            startup_timeout,
            probe_interval,
            error_cooldown,
        }
    }

    /// Ensure `sidecar` is running, starting it if it is stopped.
    ///
    /// Returns once the sidecar is `Running`. Fails when it is (or ends up)
    /// `Errored`, or when it is being stopped.
    pub async fn activate(&self, sidecar: &Arc<Sidecar>) -> Result<(), PoolError> {
        sidecar.touch();
        let mut state = sidecar.subscribe();
        loop {
            let current = *state.borrow_and_update();
            match current {
                LifecycleState::Running => return Ok(()),
                LifecycleState::Errored => {
                    return Err(PoolError::Unavailable {
                        id: sidecar.id().clone(),
                        reason: sidecar.fault().unwrap_or_else(|| "sidecar errored".to_string()),
                    })
                }
                LifecycleState::Stopped => {
                    if sidecar.transition(LifecycleState::Stopped, LifecycleState::Starting) {
                        metrics::counter!("edge_sidecar_activations_total", "sidecar" => sidecar.id().to_string())
                            .increment(1);
                        let manager = self.clone();
                        let starting = sidecar.clone();
                        tokio::spawn(async move { manager.start(starting).await });
                    }
                }
                LifecycleState::Stopping => {
                    return Err(PoolError::Unavailable {
                        id: sidecar.id().clone(),
                        reason: "sidecar is stopping".to_string(),
                    })
                }
                LifecycleState::Starting => {
                    state.changed().await.map_err(|_| PoolError::Unavailable {
                        id: sidecar.id().clone(),
                        reason: "lifecycle channel closed".to_string(),
                    })?;
                }
            }
        }
    }

    async fn start(&self, sidecar: Arc<Sidecar>) {
        let started = Instant::now();
        tracing::debug!(sidecar = %sidecar.id(), endpoint = %sidecar.endpoint(), "Starting sidecar");

        if let Some(launcher) = &self.launcher {
            match launcher.spawn(&sidecar) {
                Ok(child) => sidecar.attach_child(child).await,
                Err(e) => {
                    self.fail(&sidecar, &format!("launch failed: {e}")).await;
                    return;
                }
            }
        }

        match time::timeout(self.startup_timeout, self.wait_ready(&sidecar)).await {
            Ok(Ok(())) => {
                if sidecar.transition(LifecycleState::Starting, LifecycleState::Running) {
                    sidecar.touch();
                    self.hooks.on_start(&sidecar, started.elapsed());
                }
            }
            Ok(Err(detail)) => {
                self.fail(&sidecar, &detail).await;
            }
            Err(_) => {
                let detail = format!(
                    "not ready within {}s",
                    self.startup_timeout.as_secs_f64()
                );
                self.fail(&sidecar, &detail).await;
            }
        }
    }

    async fn wait_ready(&self, sidecar: &Sidecar) -> Result<(), String> {
        loop {
            if let Some(status) = sidecar.child_exited().await {
                return Err(format!("process exited during startup: {status}"));
            }
            match self.probe.check(sidecar.endpoint()).await {
                Ok(()) => return Ok(()),
                Err(reason) => {
                    tracing::trace!(sidecar = %sidecar.id(), reason = %reason, "Sidecar not ready yet");
                }
            }
            time::sleep(self.probe_interval).await;
        }
    }

    /// Move a starting or running sidecar to `Errored`.
    ///
    /// Returns false for a sidecar in any other state; an earlier fault and
    /// its cooldown are left as they were.
    pub async fn fail(&self, sidecar: &Sidecar, detail: &str) -> bool {
        if !sidecar.enter_errored(detail) {
            return false;
        }
        sidecar.kill_child().await;
        self.hooks.on_error(sidecar, detail);
        true
    }

    /// Deactivate a running sidecar. Returns false if it was not running.
    pub async fn stop(&self, sidecar: &Sidecar, reason: StopReason) -> bool {
        if !sidecar.transition(LifecycleState::Running, LifecycleState::Stopping) {
            return false;
        }
        sidecar.kill_child().await;
        sidecar.transition(LifecycleState::Stopping, LifecycleState::Stopped);
        self.hooks.on_stop(sidecar, reason);
        true
    }

    /// Return an errored sidecar to `Stopped` once its cooldown has passed.
    pub fn reconcile(&self, sidecar: &Sidecar) -> bool {
        if sidecar.state() != LifecycleState::Errored || sidecar.errored_for() < self.error_cooldown {
            return false;
        }
        if sidecar.leave_errored() {
            tracing::info!(sidecar = %sidecar.id(), "Errored sidecar reconciled");
            return true;
        }
        false
    }
}
