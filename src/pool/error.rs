use thiserror::Error;

use crate::pool::sidecar::SidecarId;

/// Errors surfaced by the sidecar pool.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("no selectable sidecar among {window} candidates")]
    NoCandidates { window: usize },

    #[error("sidecar {id} unavailable: {reason}")]
    Unavailable { id: SidecarId, reason: String },

    #[error("upstream request to {id} failed: {source}")]
    Upstream {
        id: SidecarId,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("cannot address sidecar {id}: {reason}")]
    InvalidUri { id: SidecarId, reason: String },
}
