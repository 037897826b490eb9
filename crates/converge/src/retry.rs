//! Bounded retry over a wall-clock budget.
//!
//! [`RetryBudget`] repeatedly evaluates a unit of async work until it
//! succeeds, the budget elapses, or an early-exit predicate fires. The
//! predicate is consulted on every failure so shared cancellation state is
//! observed between iterations, not just on the first one.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Result of a completed retry loop that did not time out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    /// The work succeeded and produced a value.
    Completed(T),
    /// The early-exit predicate fired; the loop was deliberately walked
    /// away from. No result, no error.
    Abandoned,
}

impl<T> RetryOutcome<T> {
    /// The completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Abandoned => None,
        }
    }
}

/// The budget elapsed without the work ever succeeding.
///
/// Carries the most recent failure and the measured elapsed time so the
/// caller can raise its own failure type with full context.
#[derive(Debug, Clone, thiserror::Error)]
#[error("timed out after {elapsed:?}: {last_failure}")]
pub struct RetryTimeout {
    /// Display form of the last underlying failure.
    pub last_failure: String,
    /// Wall-clock time measured from the start of the loop.
    pub elapsed: Duration,
}

/// A retry loop bounded by wall-clock time on a monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct RetryBudget {
    timeout: Duration,
    poll_interval: Duration,
}

impl RetryBudget {
    /// Default sleep between attempts: one second.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

    /// Create a budget with the default poll interval.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    /// Replace the sleep between attempts.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `work` until it succeeds, `abandon_if` fires, or the budget
    /// elapses.
    ///
    /// The work is always attempted at least once, even with a zero
    /// timeout: elapsed time is compared strictly-greater-than after a
    /// failure, so a zero budget yields exactly one attempt.
    ///
    /// `abandon_if` receives each failure and is re-evaluated every
    /// iteration; returning `true` ends the loop with
    /// [`RetryOutcome::Abandoned`], which is distinguishable from both
    /// success and timeout.
    pub async fn run<T, E, W, Fut, P>(
        &self,
        mut work: W,
        mut abandon_if: P,
    ) -> Result<RetryOutcome<T>, RetryTimeout>
    where
        W: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: FnMut(&E) -> bool,
    {
        let started = Instant::now();
        loop {
            match work().await {
                Ok(value) => return Ok(RetryOutcome::Completed(value)),
                Err(failure) => {
                    if abandon_if(&failure) {
                        return Ok(RetryOutcome::Abandoned);
                    }
                    let elapsed = started.elapsed();
                    if elapsed > self.timeout {
                        return Err(RetryTimeout {
                            last_failure: failure.to_string(),
                            elapsed,
                        });
                    }
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
