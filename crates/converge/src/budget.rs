//! Wait-budget math.
//!
//! A container's health-check parameters bound how long it may
//! legitimately take to become healthy. The remaining budget shrinks by
//! the uptime it has already consumed; a container past its window gets a
//! zero budget, which [`RetryBudget`](crate::retry::RetryBudget) turns
//! into exactly one probe. Stable containers are never waited on twice.

use std::time::Duration;

use moorage_core::types::HealthCheckConfig;

/// Remaining wait budget for a container with the given uptime.
///
/// `declared_max - uptime`, saturating at zero. A zero result means
/// "probe once, do not wait further".
pub fn remaining_wait(config: &HealthCheckConfig, uptime: Duration) -> Duration {
    config.declared_max().saturating_sub(uptime)
}
