//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, body limit)
//!     → search.rs (/search: validate query) | tool.rs (/mcp: JSON-RPC tool call)
//!       | openapi.rs (/openapi.json) | proxy.rs (everything else)
//!     → proxy.rs (pool exchange, timing merge, metrics)
//!     → error.rs (400 / 413 / 502 answers)
//!     → Send to client
//! ```

pub mod error;
pub mod openapi;
pub mod proxy;
pub mod request;
pub mod search;
pub mod server;
pub mod tool;

pub use error::EdgeError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, TimingSettings};
