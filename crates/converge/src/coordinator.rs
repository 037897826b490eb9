//! Parallel health convergence across a container fleet.
//!
//! [`ConvergenceCoordinator`] runs one wait per health-checked container,
//! shares a single cancellation signal across all of them, and reports
//! exactly one failure when anything goes wrong. Every spawned wait is
//! joined before the coordinator returns, so diagnostic output from
//! abandoned waits never outlives the reported failure.
//!
//! # Per-wait state machine
//!
//! - **Polling**: probe inside a [`RetryBudget`] whose timeout comes from
//!   the container's own health-check window and whose early-exit
//!   predicate watches the shared signal
//! - **Healthy**: terminal success
//! - **Failed**: the container exited or vanished; trips the signal
//!   before reporting
//! - **TimedOut**: the budget ran out; trips the signal
//! - **Abandoned**: a sibling tripped the signal first; finishes silently

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use moorage_core::types::{HealthSnapshot, HealthStatus};

use crate::budget::remaining_wait;
use crate::docker::ContainerInspector;
use crate::error::ConvergeError;
use crate::probe::HealthProbe;
use crate::retry::{RetryBudget, RetryOutcome};

/// Outcome of one convergence operation where every wait reached healthy.
#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceReport {
    /// Identifier for this convergence operation.
    pub operation_id: Uuid,
    /// Containers that reported healthy, sorted.
    pub healthy: Vec<String>,
    /// Wall-clock time for the whole operation.
    pub elapsed: Duration,
}

/// First-failure slot shared by all waits of one convergence call.
///
/// The cancellation token and the error slot are claimed together under
/// one lock, so exactly one failure wins even when two containers fail at
/// nearly the same instant. The token transitions false to true once and
/// is never reset.
struct FailureSlot {
    cancel: CancellationToken,
    first: Mutex<Option<ConvergeError>>,
}

impl FailureSlot {
    fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            first: Mutex::new(None),
        }
    }

    /// Claim the slot with a terminal failure.
    ///
    /// Returns true for the winning claim; later claims are suppressed
    /// and their errors dropped.
    async fn trip(&self, err: ConvergeError) -> bool {
        let mut first = self.first.lock().await;
        if first.is_none() {
            *first = Some(err);
            self.cancel.cancel();
            true
        } else {
            false
        }
    }

    /// Whether some wait already failed terminally.
    fn is_tripped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The winning failure, if any.
    async fn take(&self) -> Option<ConvergeError> {
        self.first.lock().await.take()
    }
}

/// How one wait ended; the winning error itself lives in the slot.
enum WaitVerdict {
    Healthy(String),
    Failed(String),
    Abandoned(String),
}

/// A conclusive observation that ends the polling loop.
enum Observation {
    Ready,
    Exited(HealthSnapshot),
    Vanished(ConvergeError),
}

/// Retryable "keep polling" failure inside the loop.
struct NotYetHealthy {
    status: HealthStatus,
}

impl fmt::Display for NotYetHealthy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "still {}", self.status)
    }
}

/// Waits, in parallel, for a set of containers to report healthy.
pub struct ConvergenceCoordinator<I: ContainerInspector> {
    inspector: Arc<I>,
    poll_interval: Duration,
    timeout_override: Option<Duration>,
}

impl<I: ContainerInspector> ConvergenceCoordinator<I> {
    /// Create a coordinator over a shared inspector.
    pub fn new(inspector: Arc<I>) -> Self {
        Self {
            inspector,
            poll_interval: RetryBudget::DEFAULT_POLL_INTERVAL,
            timeout_override: None,
        }
    }

    /// Replace the sleep between health polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Replace every derived per-container budget with a fixed timeout.
    pub fn with_timeout_override(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(timeout);
        self
    }

    /// Wait for every health-checked container in the stack.
    ///
    /// Containers without a health check are excluded by discovery and
    /// never waited on.
    pub async fn await_stack_healthy(&self) -> Result<ConvergenceReport, ConvergeError> {
        let services = self.inspector.list_health_checked_containers().await?;
        self.await_healthy(&services).await
    }

    /// Wait for the given containers to report healthy.
    ///
    /// Pre-flight reads each container's health-check parameters once; a
    /// container with none is a fatal configuration error raised before
    /// any polling starts. The first terminal failure among the waits is
    /// the aggregate result; the rest are abandoned silently. Calling
    /// this again on an already-healthy fleet succeeds with at most one
    /// probe per container.
    pub async fn await_healthy(
        &self,
        services: &[String],
    ) -> Result<ConvergenceReport, ConvergeError> {
        let started = Instant::now();
        let operation_id = Uuid::new_v4();
        info!(
            operation = %operation_id,
            services = services.len(),
            "waiting for stack health convergence"
        );

        // Pre-flight: read each container's window before spawning any wait.
        let mut plans = Vec::with_capacity(services.len());
        for service in services {
            let config = self
                .inspector
                .inspect_health_config(service)
                .await?
                .ok_or_else(|| ConvergeError::NoHealthCheck {
                    service: service.clone(),
                })?;
            let uptime = self.inspector.inspect_uptime(service).await?;
            let budget = self
                .timeout_override
                .unwrap_or_else(|| remaining_wait(&config, uptime));
            debug!(
                service = %service,
                budget_secs = budget.as_secs(),
                uptime_secs = uptime.as_secs(),
                "computed wait budget"
            );
            plans.push((service.clone(), budget));
        }

        let slot = Arc::new(FailureSlot::new());
        let mut waits = JoinSet::new();
        for (service, budget) in plans {
            let probe = HealthProbe::new(Arc::clone(&self.inspector));
            let slot = Arc::clone(&slot);
            let poll_interval = self.poll_interval;
            waits.spawn(wait_for_service(probe, service, budget, poll_interval, slot));
        }

        // Join every wait before returning, success or not.
        let mut healthy = Vec::new();
        while let Some(joined) = waits.join_next().await {
            match joined {
                Ok(WaitVerdict::Healthy(service)) => {
                    debug!(service = %service, "service healthy");
                    healthy.push(service);
                }
                Ok(WaitVerdict::Failed(service)) => {
                    warn!(service = %service, "service failed to converge");
                }
                Ok(WaitVerdict::Abandoned(service)) => {
                    debug!(service = %service, "wait abandoned after sibling failure");
                }
                Err(join_err) => {
                    warn!(error = %join_err, "wait task did not complete");
                }
            }
        }

        if let Some(err) = slot.take().await {
            warn!(operation = %operation_id, error = %err, "convergence failed");
            return Err(err);
        }

        healthy.sort();
        let elapsed = started.elapsed();
        info!(
            operation = %operation_id,
            healthy = healthy.len(),
            elapsed_secs = elapsed.as_secs(),
            "stack converged"
        );
        Ok(ConvergenceReport {
            operation_id,
            healthy,
            elapsed,
        })
    }
}

/// One container's wait, from Polling to a terminal verdict.
async fn wait_for_service<I: ContainerInspector>(
    probe: HealthProbe<I>,
    service: String,
    budget: Duration,
    poll_interval: Duration,
    slot: Arc<FailureSlot>,
) -> WaitVerdict {
    let last_status = Mutex::new(HealthStatus::Starting);
    let retry = RetryBudget::new(budget).with_poll_interval(poll_interval);

    let work = || {
        let probe = &probe;
        let service = &service;
        let last_status = &last_status;
        async move {
            match probe.snapshot(service).await {
                Err(err) => Ok(Observation::Vanished(err)),
                Ok(snapshot) => {
                    *last_status.lock().await = snapshot.status;
                    match snapshot.status {
                        HealthStatus::Healthy => Ok(Observation::Ready),
                        HealthStatus::Exited => Ok(Observation::Exited(snapshot)),
                        status => Err(NotYetHealthy { status }),
                    }
                }
            }
        }
    };

    match retry.run(work, |_| slot.is_tripped()).await {
        Ok(RetryOutcome::Completed(Observation::Ready)) => WaitVerdict::Healthy(service),
        Ok(RetryOutcome::Completed(Observation::Exited(snapshot))) => {
            let err = ConvergeError::Exited {
                service: service.clone(),
                restart_count: snapshot.restart_count,
            };
            // Signal first, then report; a losing claim is suppressed.
            slot.trip(err).await;
            WaitVerdict::Failed(service)
        }
        Ok(RetryOutcome::Completed(Observation::Vanished(err))) => {
            slot.trip(err).await;
            WaitVerdict::Failed(service)
        }
        Ok(RetryOutcome::Abandoned) => WaitVerdict::Abandoned(service),
        Err(timeout) => {
            let last = *last_status.lock().await;
            let err = ConvergeError::Timeout {
                service: service.clone(),
                last_status: last,
                elapsed: timeout.elapsed,
            };
            slot.trip(err).await;
            WaitVerdict::Failed(service)
        }
    }
}
