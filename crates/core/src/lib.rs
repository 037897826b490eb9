//! Shared foundation for the moorage compose test harness.
//!
//! # Module Structure
//!
//! - [`error`]: Error taxonomy (`MoorageError` and its domain sub-errors)
//! - [`config`]: `moorage.toml` parsing, env overrides, validation
//! - [`types`]: Domain types shared by every crate (`HealthStatus`,
//!   `HealthCheckConfig`, `HealthSnapshot`, ...)

pub mod config;
pub mod error;
pub mod types;

// --- Public API re-exports ---

// Errors
pub use error::{ConfigError, HealthError, MoorageError, StackError};

// Configuration
pub use config::MoorageConfig;

// Domain types
pub use types::{
    HealthCheckConfig, HealthSnapshot, HealthStatus, LifecycleState, ServiceEndpoint,
};
