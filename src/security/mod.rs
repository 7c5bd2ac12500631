//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (check request body size)
//!     → Pass to edge handlers
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject before touching the pool
//! - No trust in client-declared sizes beyond what hyper enforces

pub mod limits;

pub use limits::{body_limit_middleware, BodyLimit};
