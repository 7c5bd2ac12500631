//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → shared by value / Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; pool shape is deployment-time only
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    EdgeConfig, LaunchConfig, ListenerConfig, ObservabilityConfig, PoolConfig, SecurityConfig,
    TimingConfig,
};
