//! Docker Compose glue for the moorage harness.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ComposeError`)
//! - [`runner`]: Host command execution (`CommandRunner` trait,
//!   `ProcessRunner`)
//! - [`stack`]: Stack lifecycle and endpoint cache (`ComposeStack`)
//! - [`logs`]: Container log capture (`LogEmitter`)

pub mod error;
pub mod logs;
pub mod runner;
pub mod stack;

// --- Public API re-exports ---

// Stack lifecycle
pub use stack::ComposeStack;

// Command execution
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};

// Log capture
pub use logs::LogEmitter;

// Error
pub use error::ComposeError;
