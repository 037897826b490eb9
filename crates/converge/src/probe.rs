//! Single-container health probing.
//!
//! [`HealthProbe`] assembles a [`HealthSnapshot`] from the inspector,
//! fetching each field independently. A vanished container is a fatal,
//! distinguishable error; a transport hiccup degrades to a
//! `probe-error` classification so the caller keeps polling within its
//! budget.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use moorage_core::types::{HealthSnapshot, HealthStatus, LifecycleState};

use crate::docker::ContainerInspector;
use crate::error::ConvergeError;

/// Probes one container's condition through the inspector.
pub struct HealthProbe<I: ContainerInspector> {
    inspector: Arc<I>,
}

impl<I: ContainerInspector> Clone for HealthProbe<I> {
    fn clone(&self) -> Self {
        Self {
            inspector: Arc::clone(&self.inspector),
        }
    }
}

impl<I: ContainerInspector> HealthProbe<I> {
    /// Create a probe over a shared inspector.
    pub fn new(inspector: Arc<I>) -> Self {
        Self { inspector }
    }

    /// Take a fresh snapshot of the container's condition.
    ///
    /// Errors only when the container no longer exists; every other
    /// inspector failure degrades to [`HealthStatus::ProbeError`] so the
    /// wait loop retries it like any other not-yet-healthy observation.
    pub async fn snapshot(&self, service: &str) -> Result<HealthSnapshot, ConvergeError> {
        let state = match self.inspector.inspect_state(service).await {
            Ok(state) => state,
            Err(err @ ConvergeError::Vanished { .. }) => return Err(err),
            Err(err) => {
                debug!(service, error = %err, "state query failed, degrading to probe-error");
                return Ok(degraded_snapshot());
            }
        };

        let status = if state.is_gone() {
            HealthStatus::Exited
        } else {
            match self.inspector.inspect_health(service).await {
                Ok(status) => status,
                Err(err @ ConvergeError::Vanished { .. }) => return Err(err),
                Err(err) => {
                    debug!(service, error = %err, "health query failed, degrading to probe-error");
                    HealthStatus::ProbeError
                }
            }
        };

        let restart_count = match self.inspector.inspect_restart_count(service).await {
            Ok(count) => count,
            Err(err @ ConvergeError::Vanished { .. }) => return Err(err),
            Err(_) => 0,
        };

        let uptime = match self.inspector.inspect_uptime(service).await {
            Ok(uptime) => uptime,
            Err(err @ ConvergeError::Vanished { .. }) => return Err(err),
            Err(_) => Duration::ZERO,
        };

        Ok(HealthSnapshot {
            status,
            state,
            restart_count,
            uptime,
        })
    }
}

/// Snapshot used when even the lifecycle state could not be read.
fn degraded_snapshot() -> HealthSnapshot {
    HealthSnapshot {
        status: HealthStatus::ProbeError,
        state: LifecycleState::Unknown,
        restart_count: 0,
        uptime: Duration::ZERO,
    }
}
