//! SearXNG edge router library

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pool;
pub mod query;
pub mod security;
pub mod timing;

pub use config::schema::EdgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
