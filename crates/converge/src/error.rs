//! Convergence error types.
//!
//! [`ConvergeError`] covers every failure the convergence core can produce.
//! `From<ConvergeError> for MoorageError` lets callers propagate with `?`.

use std::time::Duration;

use moorage_core::error::{HealthError, MoorageError};
use moorage_core::types::HealthStatus;

/// Convergence domain error.
#[derive(Debug, thiserror::Error)]
pub enum ConvergeError {
    /// The service declares no health check; it can never converge.
    #[error("service '{service}' has no health check and cannot be waited on")]
    NoHealthCheck {
        /// Offending service container.
        service: String,
    },

    /// The container stopped while being waited on.
    #[error("service '{service}' exited (restarts: {restart_count})")]
    Exited {
        /// Failed service container.
        service: String,
        /// Restart count at the time of the observation.
        restart_count: u64,
    },

    /// The container disappeared while being waited on.
    #[error("service '{service}' no longer exists")]
    Vanished {
        /// Vanished service container.
        service: String,
    },

    /// The wait budget ran out before the container became healthy.
    #[error(
        "service '{service}' not healthy after {}s (last status: {last_status})",
        .elapsed.as_secs()
    )]
    Timeout {
        /// Service container that never converged.
        service: String,
        /// Last health classification observed before the budget ran out.
        last_status: HealthStatus,
        /// Wall-clock time spent waiting.
        elapsed: Duration,
    },

    /// The container runtime could not be queried for this container.
    #[error("inspect of '{service}' failed: {reason}")]
    Inspect {
        /// Container being inspected.
        service: String,
        /// Underlying transport failure.
        reason: String,
    },

    /// Daemon-level failure (connection, listing).
    #[error("docker error: {0}")]
    Docker(String),
}

impl From<ConvergeError> for MoorageError {
    fn from(err: ConvergeError) -> Self {
        match err {
            ConvergeError::NoHealthCheck { service } => {
                MoorageError::Health(HealthError::NoHealthCheck(service))
            }
            ConvergeError::Exited { service, .. } => {
                MoorageError::Health(HealthError::Exited(service))
            }
            ConvergeError::Vanished { service } => {
                MoorageError::Health(HealthError::Vanished(service))
            }
            ConvergeError::Timeout {
                service,
                last_status,
                elapsed,
            } => MoorageError::Health(HealthError::Timeout {
                service,
                elapsed_secs: elapsed.as_secs(),
                last_status: last_status.to_string(),
            }),
            ConvergeError::Inspect { .. } | ConvergeError::Docker(_) => {
                MoorageError::Health(HealthError::Inspect(err.to_string()))
            }
        }
    }
}
