//! Uniform random selection over a candidate window.

use std::sync::Arc;

use rand::Rng;

use crate::pool::sidecar::Sidecar;

/// Chooses the sidecar that receives a request.
pub trait Selector: Send + Sync + std::fmt::Debug {
    /// Pick one of the first `window` slots, or `None` if none is selectable.
    fn select(&self, slots: &[Arc<Sidecar>], window: usize) -> Option<Arc<Sidecar>>;
}

/// Stateless, session-less uniform draw among the first `k` selectable slots
/// (neither errored nor stopping).
#[derive(Debug, Default)]
pub struct RandomWindow;

impl RandomWindow {
    pub fn new() -> Self {
        Self
    }
}

impl Selector for RandomWindow {
    fn select(&self, slots: &[Arc<Sidecar>], window: usize) -> Option<Arc<Sidecar>> {
        let candidates: Vec<&Arc<Sidecar>> = slots
            .iter()
            .take(window)
            .filter(|s| s.is_selectable())
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..candidates.len());
        Some(candidates[index].clone())
    }
}
