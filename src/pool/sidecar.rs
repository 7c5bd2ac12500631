//! Sidecar instance abstraction.
//!
//! # Responsibilities
//! - Represent one pool slot (identity + endpoint)
//! - Hold the lifecycle state and let waiters observe it
//! - Track in-flight exchanges and last use (for idle reaping)

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::http::uri::Authority;
use tokio::process::Child;
use tokio::sync::watch;

/// Stable identity of a pool slot (`instance-<n>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SidecarId(String);

impl SidecarId {
    pub fn for_slot(slot: usize) -> Self {
        Self(format!("instance-{slot}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SidecarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a sidecar.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
    Errored = 4,
}

impl From<u8> for LifecycleState {
    fn from(val: u8) -> Self {
        match val {
            1 => LifecycleState::Starting,
            2 => LifecycleState::Running,
            3 => LifecycleState::Stopping,
            4 => LifecycleState::Errored,
            _ => LifecycleState::Stopped,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Stopped => "stopped",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// One slot of the pool.
#[derive(Debug)]
pub struct Sidecar {
    id: SidecarId,
    slot: usize,
    endpoint: Authority,
    state: watch::Sender<LifecycleState>,
    /// Reference point for `last_used_ms`.
    epoch: Instant,
    last_used_ms: AtomicU64,
    errored_at_ms: AtomicU64,
    in_flight: AtomicUsize,
    fault: Mutex<Option<String>>,
    child: tokio::sync::Mutex<Option<Child>>,
}

impl Sidecar {
    pub fn new(slot: usize, endpoint: Authority) -> Self {
        let (state, _) = watch::channel(LifecycleState::Stopped);
        Self {
            id: SidecarId::for_slot(slot),
            slot,
            endpoint,
            state,
            epoch: Instant::now(),
            last_used_ms: AtomicU64::new(0),
            errored_at_ms: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            fault: Mutex::new(None),
            child: tokio::sync::Mutex::new(None),
        }
    }

    pub fn id(&self) -> &SidecarId {
        &self.id
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn endpoint(&self) -> &Authority {
        &self.endpoint
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Errored sidecars are excluded until reconciled, stopping ones until stopped.
    pub fn is_selectable(&self) -> bool {
        !matches!(self.state(), LifecycleState::Errored | LifecycleState::Stopping)
    }

    /// Move `from → to` atomically. Returns false if the state was not `from`.
    pub(crate) fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if changed {
            self.observe(from, to);
        }
        changed
    }

    /// Move `Starting | Running → Errored`, recording `detail` in the same step.
    ///
    /// Returns false, leaving any earlier fault untouched, if the sidecar was
    /// in another state.
    pub(crate) fn enter_errored(&self, detail: &str) -> bool {
        let mut from = None;
        let changed = self.state.send_if_modified(|state| {
            if !matches!(*state, LifecycleState::Starting | LifecycleState::Running) {
                return false;
            }
            // Waiters woken by this change must already see the fault.
            self.errored_at_ms.store(self.now_ms(), Ordering::Relaxed);
            if let Ok(mut fault) = self.fault.lock() {
                *fault = Some(detail.to_string());
            }
            from = Some(*state);
            *state = LifecycleState::Errored;
            true
        });
        if let Some(from) = from {
            self.observe(from, LifecycleState::Errored);
        }
        changed
    }

    /// Move `Errored → Stopped`, clearing the fault in the same step.
    pub(crate) fn leave_errored(&self) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if *state != LifecycleState::Errored {
                return false;
            }
            if let Ok(mut fault) = self.fault.lock() {
                *fault = None;
            }
            *state = LifecycleState::Stopped;
            true
        });
        if changed {
            self.observe(LifecycleState::Errored, LifecycleState::Stopped);
        }
        changed
    }

    fn observe(&self, from: LifecycleState, to: LifecycleState) {
        tracing::debug!(sidecar = %self.id, from = %from, to = %to, "Lifecycle transition");
        metrics::gauge!("edge_sidecar_state", "sidecar" => self.id.to_string()).set(to as u8 as f64);
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Record that a request was routed here.
    pub fn touch(&self) {
        self.last_used_ms.store(self.now_ms(), Ordering::Relaxed);
    }

    /// Time since the last routed request.
    pub fn idle_for(&self) -> Duration {
        let last = self.last_used_ms.load(Ordering::Relaxed);
        Duration::from_millis(self.now_ms().saturating_sub(last))
    }

    /// Detail of the last fault, while errored.
    pub fn fault(&self) -> Option<String> {
        self.fault.lock().ok().and_then(|f| f.clone())
    }

    /// Time spent in the errored state.
    pub fn errored_for(&self) -> Duration {
        let at = self.errored_at_ms.load(Ordering::Relaxed);
        Duration::from_millis(self.now_ms().saturating_sub(at))
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Count an exchange as in flight until the guard drops.
    pub fn begin_exchange(self: &Arc<Self>) -> ExchangeGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        self.touch();
        ExchangeGuard {
            sidecar: self.clone(),
        }
    }

    pub(crate) async fn attach_child(&self, child: Child) {
        *self.child.lock().await = Some(child);
    }

    /// Kill the attached process, if any.
    pub(crate) async fn kill_child(&self) {
        let Some(mut child) = self.child.lock().await.take() else {
            return;
        };
        if let Err(e) = child.kill().await {
            tracing::warn!(sidecar = %self.id, error = %e, "Failed to kill sidecar process");
        }
    }

    /// Exit status of the attached process if it already terminated.
    pub(crate) async fn child_exited(&self) -> Option<String> {
        let mut guard = self.child.lock().await;
        let child = guard.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => Some(status.to_string()),
            Ok(None) => None,
            Err(e) => Some(e.to_string()),
        }
    }
}

/// A RAII guard for an in-flight exchange.
#[derive(Debug)]
pub struct ExchangeGuard {
    sidecar: Arc<Sidecar>,
}

impl Deref for ExchangeGuard {
    type Target = Sidecar;
    fn deref(&self) -> &Self::Target {
        &self.sidecar
    }
}

impl Drop for ExchangeGuard {
    fn drop(&mut self) {
        self.sidecar.touch();
        self.sidecar.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
