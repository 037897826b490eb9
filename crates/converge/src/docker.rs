//! Container-runtime abstraction for testability.
//!
//! The [`ContainerInspector`] trait is the narrow interface the
//! convergence core consumes from the container runtime: health
//! classification, health-check parameters, lifecycle state, restart
//! count, and uptime. Production code uses [`BollardInspector`] against
//! the Docker daemon; tests script a mock.
//!
//! # Error Handling
//!
//! - **404 errors**: converted to [`ConvergeError::Vanished`], which
//!   short-circuits a wait instead of being retried
//! - **Other transport errors**: converted to [`ConvergeError::Inspect`]
//!   and retried by the caller within its budget

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use moorage_core::types::{HealthCheckConfig, HealthStatus, LifecycleState};

use crate::error::ConvergeError;

/// Docker's defaults when a healthcheck omits a field.
const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_HEALTH_RETRIES: u32 = 3;

/// Validates a container ID before it reaches the Docker API.
///
/// Docker container IDs are 64-character hex strings (or shorter prefix
/// forms); anything else is rejected up front.
fn validate_container_id(id: &str) -> Result<(), ConvergeError> {
    if id.is_empty() || id.len() > 64 {
        return Err(ConvergeError::Inspect {
            service: id.to_owned(),
            reason: format!("invalid container ID: length {} (must be 1-64)", id.len()),
        });
    }
    if !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConvergeError::Inspect {
            service: id.to_owned(),
            reason: "invalid container ID: contains non-hex characters".to_owned(),
        });
    }
    Ok(())
}

/// Narrow view of the container runtime consumed by the convergence core.
///
/// Every method is a fresh query; nothing is cached between calls.
pub trait ContainerInspector: Send + Sync + 'static {
    /// IDs of stack containers that declare a health check.
    ///
    /// Containers without one are excluded from convergence entirely.
    fn list_health_checked_containers(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, ConvergeError>> + Send;

    /// Current lifecycle state.
    fn inspect_state(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<LifecycleState, ConvergeError>> + Send;

    /// Current health classification.
    fn inspect_health(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<HealthStatus, ConvergeError>> + Send;

    /// Declared health-check parameters, or `None` when the container
    /// defines no health check.
    fn inspect_health_config(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<HealthCheckConfig>, ConvergeError>> + Send;

    /// How many times the runtime has restarted the container.
    fn inspect_restart_count(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<u64, ConvergeError>> + Send;

    /// Now minus the container's start time.
    fn inspect_uptime(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Duration, ConvergeError>> + Send;
}

/// Production inspector backed by `bollard`.
///
/// Optionally scoped to a compose project via the
/// `com.docker.compose.project` label so unrelated containers on the host
/// never enter convergence.
pub struct BollardInspector {
    docker: Arc<bollard::Docker>,
    project: Option<String>,
}

impl BollardInspector {
    /// Connect to Docker using the default local socket.
    pub fn connect_local() -> Result<Self, ConvergeError> {
        let docker = bollard::Docker::connect_with_local_defaults()
            .map_err(|e| ConvergeError::Docker(format!("failed to connect to docker: {e}")))?;
        Ok(Self {
            docker: Arc::new(docker),
            project: None,
        })
    }

    /// Connect to Docker using a specific socket path.
    pub fn connect_with_socket(socket_path: &str) -> Result<Self, ConvergeError> {
        let docker =
            bollard::Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| {
                    ConvergeError::Docker(format!(
                        "failed to connect to docker at {socket_path}: {e}"
                    ))
                })?;
        Ok(Self {
            docker: Arc::new(docker),
            project: None,
        })
    }

    /// Restrict listing to one compose project.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    async fn inspect(
        &self,
        id: &str,
    ) -> Result<bollard::models::ContainerInspectResponse, ConvergeError> {
        validate_container_id(id)?;
        self.docker.inspect_container(id, None).await.map_err(|e| {
            if e.to_string().contains("404") {
                ConvergeError::Vanished {
                    service: id.to_owned(),
                }
            } else {
                ConvergeError::Inspect {
                    service: id.to_owned(),
                    reason: e.to_string(),
                }
            }
        })
    }
}

/// Extract declared health-check parameters from an inspect response.
///
/// A `NONE` test disables the check, which counts as "no health check".
fn health_config_from(
    response: &bollard::models::ContainerInspectResponse,
) -> Option<HealthCheckConfig> {
    let healthcheck = response.config.as_ref()?.healthcheck.as_ref()?;
    if let Some(test) = &healthcheck.test
        && test.first().map(String::as_str) == Some("NONE")
    {
        return None;
    }
    let nanos_to_duration =
        |nanos: i64| Duration::from_nanos(u64::try_from(nanos).unwrap_or(0));
    let interval = healthcheck
        .interval
        .filter(|n| *n > 0)
        .map(nanos_to_duration)
        .unwrap_or(DEFAULT_HEALTH_INTERVAL);
    let start_period = healthcheck
        .start_period
        .filter(|n| *n > 0)
        .map(nanos_to_duration)
        .unwrap_or(Duration::ZERO);
    let retries = healthcheck
        .retries
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(DEFAULT_HEALTH_RETRIES);
    Some(HealthCheckConfig {
        start_period,
        interval,
        retries,
    })
}

/// Parse Docker's RFC 3339 `StartedAt` into an uptime.
///
/// Docker reports `0001-01-01T00:00:00Z` for a container that never
/// started; that is zero uptime, not two millennia.
fn uptime_from_started_at(started_at: Option<&str>) -> Duration {
    let Some(started_at) = started_at else {
        return Duration::ZERO;
    };
    if started_at.starts_with("0001-") {
        return Duration::ZERO;
    }
    match chrono::DateTime::parse_from_rfc3339(started_at) {
        Ok(started) => chrono::Utc::now()
            .signed_duration_since(started)
            .to_std()
            .unwrap_or(Duration::ZERO),
        Err(e) => {
            debug!(started_at, error = %e, "unparseable StartedAt, assuming zero uptime");
            Duration::ZERO
        }
    }
}

impl ContainerInspector for BollardInspector {
    async fn list_health_checked_containers(&self) -> Result<Vec<String>, ConvergeError> {
        use bollard::container::ListContainersOptions;

        let mut filters = HashMap::new();
        if let Some(project) = &self.project {
            filters.insert(
                "label".to_owned(),
                vec![format!("com.docker.compose.project={project}")],
            );
        }
        // Include stopped containers so an exited service is discovered
        // and reported instead of silently skipped.
        let options = ListContainersOptions::<String> {
            all: true,
            filters,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| ConvergeError::Docker(format!("list containers failed: {e}")))?;

        let mut health_checked = Vec::with_capacity(containers.len());
        for container in containers {
            let Some(id) = container.id else { continue };
            let response = self.inspect(&id).await?;
            if health_config_from(&response).is_some() {
                health_checked.push(id);
            } else {
                debug!(container = %id, "skipping container without health check");
            }
        }
        Ok(health_checked)
    }

    async fn inspect_state(&self, id: &str) -> Result<LifecycleState, ConvergeError> {
        let response = self.inspect(id).await?;
        let state = response
            .state
            .and_then(|s| s.status)
            .map(|s| LifecycleState::from_str_loose(&format!("{s:?}")))
            .unwrap_or(LifecycleState::Unknown);
        Ok(state)
    }

    async fn inspect_health(&self, id: &str) -> Result<HealthStatus, ConvergeError> {
        let response = self.inspect(id).await?;
        let status = response
            .state
            .and_then(|s| s.health)
            .and_then(|h| h.status)
            .map(|s| format!("{s:?}"))
            .and_then(|s| HealthStatus::from_str_loose(&s))
            .unwrap_or(HealthStatus::NoHealthCheck);
        Ok(status)
    }

    async fn inspect_health_config(
        &self,
        id: &str,
    ) -> Result<Option<HealthCheckConfig>, ConvergeError> {
        let response = self.inspect(id).await?;
        Ok(health_config_from(&response))
    }

    async fn inspect_restart_count(&self, id: &str) -> Result<u64, ConvergeError> {
        let response = self.inspect(id).await?;
        Ok(response
            .restart_count
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0))
    }

    async fn inspect_uptime(&self, id: &str) -> Result<Duration, ConvergeError> {
        let response = self.inspect(id).await?;
        let started_at = response.state.and_then(|s| s.started_at);
        Ok(uptime_from_started_at(started_at.as_deref()))
    }
}

/// Scripted inspector for tests.
///
/// Health and state queries pop scripted sequences; the final entry
/// repeats once a sequence drains.
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct ScriptedContainer {
        pub health_config: Option<HealthCheckConfig>,
        pub uptime: Duration,
        pub restart_count: u64,
        pub healths: VecDeque<HealthStatus>,
        pub states: VecDeque<LifecycleState>,
        pub vanished: bool,
    }

    #[derive(Default)]
    pub(crate) struct MockInspector {
        containers: Mutex<HashMap<String, ScriptedContainer>>,
        health_probes: Mutex<HashMap<String, u64>>,
    }

    impl MockInspector {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_container(self, id: &str, script: ScriptedContainer) -> Self {
            self.containers
                .lock()
                .expect("mock lock")
                .insert(id.to_owned(), script);
            self
        }

        /// How many times `inspect_health` ran for a container.
        pub fn health_probe_count(&self, id: &str) -> u64 {
            self.health_probes
                .lock()
                .expect("mock lock")
                .get(id)
                .copied()
                .unwrap_or(0)
        }

        fn vanished_err(id: &str) -> ConvergeError {
            ConvergeError::Vanished {
                service: id.to_owned(),
            }
        }
    }

    impl ContainerInspector for MockInspector {
        async fn list_health_checked_containers(&self) -> Result<Vec<String>, ConvergeError> {
            let containers = self.containers.lock().expect("mock lock");
            let mut ids: Vec<String> = containers
                .iter()
                .filter(|(_, c)| c.health_config.is_some() && !c.vanished)
                .map(|(id, _)| id.clone())
                .collect();
            ids.sort();
            Ok(ids)
        }

        async fn inspect_state(&self, id: &str) -> Result<LifecycleState, ConvergeError> {
            let mut containers = self.containers.lock().expect("mock lock");
            let container = containers.get_mut(id).ok_or_else(|| Self::vanished_err(id))?;
            if container.vanished {
                return Err(Self::vanished_err(id));
            }
            let state = if container.states.len() > 1 {
                container.states.pop_front().unwrap_or(LifecycleState::Running)
            } else {
                container
                    .states
                    .front()
                    .copied()
                    .unwrap_or(LifecycleState::Running)
            };
            Ok(state)
        }

        async fn inspect_health(&self, id: &str) -> Result<HealthStatus, ConvergeError> {
            *self
                .health_probes
                .lock()
                .expect("mock lock")
                .entry(id.to_owned())
                .or_insert(0) += 1;
            let mut containers = self.containers.lock().expect("mock lock");
            let container = containers.get_mut(id).ok_or_else(|| Self::vanished_err(id))?;
            if container.vanished {
                return Err(Self::vanished_err(id));
            }
            let status = if container.healths.len() > 1 {
                container.healths.pop_front().unwrap_or(HealthStatus::Starting)
            } else {
                container
                    .healths
                    .front()
                    .copied()
                    .unwrap_or(HealthStatus::Starting)
            };
            Ok(status)
        }

        async fn inspect_health_config(
            &self,
            id: &str,
        ) -> Result<Option<HealthCheckConfig>, ConvergeError> {
            let containers = self.containers.lock().expect("mock lock");
            let container = containers.get(id).ok_or_else(|| Self::vanished_err(id))?;
            if container.vanished {
                return Err(Self::vanished_err(id));
            }
            Ok(container.health_config)
        }

        async fn inspect_restart_count(&self, id: &str) -> Result<u64, ConvergeError> {
            let containers = self.containers.lock().expect("mock lock");
            let container = containers.get(id).ok_or_else(|| Self::vanished_err(id))?;
            Ok(container.restart_count)
        }

        async fn inspect_uptime(&self, id: &str) -> Result<Duration, ConvergeError> {
            let containers = self.containers.lock().expect("mock lock");
            let container = containers.get(id).ok_or_else(|| Self::vanished_err(id))?;
            Ok(container.uptime)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_id() {
        assert!(validate_container_id("").is_err());
    }

    #[test]
    fn validate_rejects_oversized_id() {
        let id = "a".repeat(65);
        assert!(validate_container_id(&id).is_err());
    }

    #[test]
    fn validate_rejects_non_hex() {
        assert!(validate_container_id("not-hex!").is_err());
        assert!(validate_container_id("abc123; rm -rf /").is_err());
    }

    #[test]
    fn validate_accepts_hex_ids() {
        assert!(validate_container_id("abc123def456").is_ok());
        let full = "f".repeat(64);
        assert!(validate_container_id(&full).is_ok());
    }

    #[test]
    fn uptime_from_missing_started_at_is_zero() {
        assert_eq!(uptime_from_started_at(None), Duration::ZERO);
    }

    #[test]
    fn uptime_from_never_started_is_zero() {
        assert_eq!(
            uptime_from_started_at(Some("0001-01-01T00:00:00Z")),
            Duration::ZERO
        );
    }

    #[test]
    fn uptime_from_garbage_is_zero() {
        assert_eq!(uptime_from_started_at(Some("last tuesday")), Duration::ZERO);
    }

    #[test]
    fn uptime_from_past_timestamp_is_positive() {
        let started = chrono::Utc::now() - chrono::Duration::seconds(90);
        let uptime = uptime_from_started_at(Some(&started.to_rfc3339()));
        assert!(uptime >= Duration::from_secs(89));
        assert!(uptime <= Duration::from_secs(120));
    }

    #[test]
    fn health_config_from_full_healthcheck() {
        let response = inspect_response_with_healthcheck(Some(bollard::models::HealthConfig {
            test: Some(vec!["CMD-SHELL".to_owned(), "true".to_owned()]),
            interval: Some(10_000_000_000),
            timeout: None,
            retries: Some(5),
            start_period: Some(60_000_000_000),
            start_interval: None,
        }));
        let config = health_config_from(&response).unwrap();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.retries, 5);
        assert_eq!(config.start_period, Duration::from_secs(60));
        assert_eq!(config.declared_max(), Duration::from_secs(110));
    }

    #[test]
    fn health_config_defaults_for_omitted_fields() {
        let response = inspect_response_with_healthcheck(Some(bollard::models::HealthConfig {
            test: Some(vec!["CMD".to_owned(), "/bin/check".to_owned()]),
            interval: None,
            timeout: None,
            retries: None,
            start_period: None,
            start_interval: None,
        }));
        let config = health_config_from(&response).unwrap();
        assert_eq!(config.interval, DEFAULT_HEALTH_INTERVAL);
        assert_eq!(config.retries, DEFAULT_HEALTH_RETRIES);
        assert_eq!(config.start_period, Duration::ZERO);
    }

    #[test]
    fn health_config_none_test_means_no_healthcheck() {
        let response = inspect_response_with_healthcheck(Some(bollard::models::HealthConfig {
            test: Some(vec!["NONE".to_owned()]),
            interval: None,
            timeout: None,
            retries: None,
            start_period: None,
            start_interval: None,
        }));
        assert!(health_config_from(&response).is_none());
    }

    #[test]
    fn health_config_absent_healthcheck() {
        let response = inspect_response_with_healthcheck(None);
        assert!(health_config_from(&response).is_none());
    }

    fn inspect_response_with_healthcheck(
        healthcheck: Option<bollard::models::HealthConfig>,
    ) -> bollard::models::ContainerInspectResponse {
        bollard::models::ContainerInspectResponse {
            config: Some(bollard::models::ContainerConfig {
                healthcheck,
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
