//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window <= capacity, timeouts > 0, ports fit)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::EdgeConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check an already-deserialized configuration.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }

    let pool = &config.pool;
    if pool.capacity == 0 {
        errors.push(ValidationError::new("pool.capacity", "must be at least 1"));
    }
    if pool.window == 0 {
        errors.push(ValidationError::new("pool.window", "must be at least 1"));
    }
    if pool.window > pool.capacity {
        errors.push(ValidationError::new(
            "pool.window",
            format!("{} exceeds pool.capacity {}", pool.window, pool.capacity),
        ));
    }
    if (pool.base_port as usize) + pool.capacity.saturating_sub(1) > u16::MAX as usize {
        errors.push(ValidationError::new(
            "pool.base_port",
            "base_port + capacity overflows the port range",
        ));
    }
    if !pool.ready_path.starts_with('/') {
        errors.push(ValidationError::new("pool.ready_path", "must start with '/'"));
    }
    if pool.startup_timeout_secs == 0 {
        errors.push(ValidationError::new("pool.startup_timeout_secs", "must be positive"));
    }
    if pool.probe_interval_ms == 0 {
        errors.push(ValidationError::new("pool.probe_interval_ms", "must be positive"));
    }
    if pool.reap_interval_secs == 0 {
        errors.push(ValidationError::new("pool.reap_interval_secs", "must be positive"));
    }
    if let Some(launch) = &pool.launch {
        if launch.program.trim().is_empty() {
            errors.push(ValidationError::new("pool.launch.program", "must not be empty"));
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be positive"));
    }

    for name in &config.timing.inner_headers {
        if axum::http::HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "timing.inner_headers",
                format!("invalid header name: {name}"),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
