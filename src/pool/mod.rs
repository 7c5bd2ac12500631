//! Sidecar pool subsystem.
//!
//! # Data Flow
//! ```text
//! Edge request
//!     → manager.rs (SidecarPool::select_and_forward)
//!     → selector.rs (uniform draw among the first k selectable slots)
//!     → lifecycle.rs (activate: Stopped → Starting → Running, or wait)
//!         → launch.rs (optional child process)
//!         → probe.rs (readiness)
//!     → forward verbatim to the sidecar endpoint
//!     → Exchange (response + activation/upstream durations)
//!
//! Background:
//!     reaper.rs → stop idle sidecars, reconcile errored ones, stop all on shutdown
//! ```
//!
//! # Design Decisions
//! - The edge only sees the `SidecarPool` trait; lifecycle state stays inside the pool
//! - Selection is stateless; no affinity, no health scores
//! - Errored sidecars are excluded until reconciled
//! - No failover: one sidecar per request, its outcome is final

pub mod error;
pub mod launch;
pub mod lifecycle;
pub mod manager;
pub mod probe;
pub mod reaper;
pub mod selector;
pub mod sidecar;

pub use error::PoolError;
pub use lifecycle::{LifecycleHooks, LifecycleManager, StopReason, TracingHooks};
pub use manager::{Exchange, LocalPool, SidecarPool};
pub use reaper::Reaper;
pub use selector::{RandomWindow, Selector};
pub use sidecar::{LifecycleState, Sidecar, SidecarId};
