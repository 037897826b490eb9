//! Domain types shared across the harness.
//!
//! Every crate exchanges container observations through these types.
//! All of them are plain data; nothing here talks to the Docker daemon.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Health classification of a single container at one instant.
///
/// Produced fresh on every probe and never cached beyond a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthStatus {
    /// Inside the start period, failures do not count yet.
    Starting,
    /// The health check is passing.
    Healthy,
    /// Consecutive failures exceeded the configured retries.
    Unhealthy,
    /// The container stopped running.
    Exited,
    /// The container defines no health check at all.
    NoHealthCheck,
    /// The health state could not be read this round.
    ProbeError,
}

impl HealthStatus {
    /// Parse a Docker inspect health string, case-insensitively.
    ///
    /// Docker reports `starting`, `healthy`, `unhealthy`, or `none`;
    /// quoted values (a historical inspect formatting quirk) are accepted.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().trim_matches('\'').to_lowercase().as_str() {
            "starting" => Some(Self::Starting),
            "healthy" => Some(Self::Healthy),
            "unhealthy" => Some(Self::Unhealthy),
            "exited" => Some(Self::Exited),
            "none" | "no-healthcheck" => Some(Self::NoHealthCheck),
            _ => None,
        }
    }

    /// Whether this status means the wait is over, one way or the other.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Healthy | Self::Exited)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Exited => write!(f, "exited"),
            Self::NoHealthCheck => write!(f, "no-healthcheck"),
            Self::ProbeError => write!(f, "probe-error"),
        }
    }
}

/// Container lifecycle state as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    Created,
    Running,
    Restarting,
    Paused,
    Removing,
    Exited,
    Dead,
    Unknown,
}

impl LifecycleState {
    /// Parse a Docker state string, case-insensitively.
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "created" => Self::Created,
            "running" => Self::Running,
            "restarting" => Self::Restarting,
            "paused" => Self::Paused,
            "removing" => Self::Removing,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }

    /// Whether the container is no longer able to become healthy.
    pub fn is_gone(self) -> bool {
        matches!(self, Self::Exited | Self::Dead)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Restarting => "restarting",
            Self::Paused => "paused",
            Self::Removing => "removing",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Health-check parameters a container declares in its image or compose file.
///
/// Immutable for the container's lifetime; read once per wait operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    /// Grace period before failing checks count against the container.
    pub start_period: Duration,
    /// Time between consecutive checks.
    pub interval: Duration,
    /// Consecutive failures tolerated before the container is unhealthy.
    pub retries: u32,
}

impl HealthCheckConfig {
    /// The longest a container may legitimately take to become healthy:
    /// `start_period + interval * retries`.
    pub fn declared_max(&self) -> Duration {
        self.start_period + self.interval * self.retries
    }
}

/// One container's observed condition, assembled field by field per probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Health classification for this poll.
    pub status: HealthStatus,
    /// Lifecycle state for this poll.
    pub state: LifecycleState,
    /// How many times the runtime restarted the container.
    pub restart_count: u64,
    /// Now minus the container's start time.
    pub uptime: Duration,
}

impl fmt::Display for HealthSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) restarts={} uptime={}s",
            self.status,
            self.state,
            self.restart_count,
            self.uptime.as_secs(),
        )
    }
}

/// Host-side address of a published compose service port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
