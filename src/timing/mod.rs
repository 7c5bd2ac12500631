//! Timing telemetry subsystem.
//!
//! # Data Flow
//! ```text
//! Sidecar response headers (server-timing, x-sidecar-server-timing)
//!     → parser.rs (total parse into Measured | Marker metrics)
//!     → merge.rs (append edge phases measured by EdgeTimer)
//!     → single outward Server-Timing header (Measured only)
//!     → metrics mapping (display key → duration) for the tool surface
//! ```

pub mod merge;
pub mod parser;

pub use merge::{apply_to_response, merge, render, EdgeTimer, SERVER_TIMING};
pub use parser::{metrics_map, parse, parse_all, TimingMetric};
