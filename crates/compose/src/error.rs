//! Compose glue error types.

use std::time::Duration;

use moorage_core::error::{MoorageError, StackError};

/// Compose domain error.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// An external command exited non-zero.
    #[error("command '{command}' failed with status {status}: {stderr}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit status, -1 when killed by a signal.
        status: i32,
        /// Captured stderr, trimmed.
        stderr: String,
    },

    /// An external command could not be spawned or ran past its timeout.
    #[error("command '{command}' did not complete: {reason}")]
    CommandAborted { command: String, reason: String },

    /// Compose never produced a container for the service.
    #[error("compose never started a service named '{service}' in {}s", .waited.as_secs())]
    ServiceNotFound {
        service: String,
        /// How long the harness waited before giving up.
        waited: Duration,
    },

    /// The service does not publish the requested port.
    #[error("could not retrieve endpoint for {service}:{port}")]
    PortNotPublished { service: String, port: u16 },

    /// Command output could not be interpreted.
    #[error("unparseable output from '{context}': {output}")]
    Parse { context: String, output: String },

    /// Writing captured logs to the sink failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ComposeError> for MoorageError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::CommandFailed {
                command,
                status,
                stderr,
            } => MoorageError::Stack(StackError::CommandFailed {
                command,
                status,
                stderr,
            }),
            ComposeError::CommandAborted { command, reason } => {
                MoorageError::Stack(StackError::CommandAborted { command, reason })
            }
            ComposeError::ServiceNotFound { service, .. } => {
                MoorageError::Stack(StackError::ServiceNotFound(service))
            }
            ComposeError::PortNotPublished { service, port } => {
                MoorageError::Stack(StackError::PortNotPublished { service, port })
            }
            ComposeError::Parse { output, .. } => {
                MoorageError::Stack(StackError::Parse(output))
            }
            ComposeError::Io(e) => MoorageError::Io(e),
        }
    }
}
