//! Health-convergence core for the moorage harness.
//!
//! Waits, in parallel, for an arbitrary set of independently
//! health-checked containers to become ready, cancels siblings as soon as
//! one wait fails terminally, and derives each wait's budget from the
//! container's own health-check window and elapsed uptime.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ConvergeError`)
//! - [`retry`]: Bounded retry primitive (`RetryBudget`)
//! - [`budget`]: Wait-budget math (`remaining_wait`)
//! - [`docker`]: Runtime abstraction (`ContainerInspector` trait,
//!   `BollardInspector`)
//! - [`probe`]: Per-container snapshots (`HealthProbe`)
//! - [`coordinator`]: Parallel waits and cancellation
//!   (`ConvergenceCoordinator`)
//!
//! # Architecture
//!
//! ```text
//! ConvergenceCoordinator
//!     |  one task per container (JoinSet)
//!     v
//! RetryBudget(remaining_wait) -- polls --> HealthProbe
//!     |                                        |
//!     | abandon_if                             v
//!     +--- FailureSlot (CancellationToken) ContainerInspector --> Docker
//! ```

pub mod budget;
pub mod coordinator;
pub mod docker;
pub mod error;
pub mod probe;
pub mod retry;

// --- Public API re-exports ---

// Coordinator
pub use coordinator::{ConvergenceCoordinator, ConvergenceReport};

// Budget math
pub use budget::remaining_wait;

// Runtime abstraction
pub use docker::{BollardInspector, ContainerInspector};

// Error
pub use error::ConvergeError;

// Probe
pub use probe::HealthProbe;

// Retry primitive
pub use retry::{RetryBudget, RetryOutcome, RetryTimeout};
