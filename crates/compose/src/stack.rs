//! Compose stack lifecycle.
//!
//! [`ComposeStack`] drives `docker compose` for one project: bringing the
//! stack up and down, resolving service containers, publishing endpoint
//! lookups, and running commands inside services. The published-endpoint
//! cache is the only state that survives between calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use moorage_converge::{RetryBudget, RetryOutcome};
use moorage_core::types::ServiceEndpoint;

use crate::error::ComposeError;
use crate::runner::{CommandOutput, CommandRunner};

/// One compose project under harness control.
pub struct ComposeStack<R: CommandRunner> {
    runner: Arc<R>,
    compose_file: String,
    project_name: Option<String>,
    start_timeout: Duration,
    poll_interval: Duration,
    endpoints: Mutex<HashMap<(String, u16), ServiceEndpoint>>,
}

impl<R: CommandRunner> ComposeStack<R> {
    /// Create a stack for the given compose file.
    pub fn new(runner: Arc<R>, compose_file: impl Into<String>) -> Self {
        Self {
            runner,
            compose_file: compose_file.into(),
            project_name: None,
            start_timeout: Duration::from_secs(120),
            poll_interval: RetryBudget::DEFAULT_POLL_INTERVAL,
            endpoints: Mutex::new(HashMap::new()),
        }
    }

    /// Pin the compose project name instead of compose's directory default.
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    /// How long `service_container` waits for compose to report a container.
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Sleep between `service_container` attempts.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn compose_args(&self, tail: &[&str]) -> Vec<String> {
        let mut args = vec![
            "compose".to_owned(),
            "--file".to_owned(),
            self.compose_file.clone(),
        ];
        if let Some(project) = &self.project_name {
            args.push("--project-name".to_owned());
            args.push(project.clone());
        }
        args.extend(tail.iter().map(|s| (*s).to_owned()));
        args
    }

    /// Run a compose subcommand, treating non-zero exit as failure.
    async fn compose(&self, tail: &[&str]) -> Result<CommandOutput, ComposeError> {
        let args = self.compose_args(tail);
        let output = self.runner.run("docker", &args).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(ComposeError::CommandFailed {
                command: format!("docker {}", args.join(" ")),
                status: output.status,
                stderr: output.stderr.trim().to_owned(),
            })
        }
    }

    /// Bring the stack up detached.
    pub async fn up(&self) -> Result<(), ComposeError> {
        info!(compose_file = %self.compose_file, "bringing stack up");
        self.compose(&["up", "--detach"]).await?;
        Ok(())
    }

    /// Tear the stack down, optionally removing volumes.
    pub async fn down(&self, remove_volumes: bool) -> Result<(), ComposeError> {
        info!(remove_volumes, "bringing stack down");
        if remove_volumes {
            self.compose(&["down", "--volumes"]).await?;
        } else {
            self.compose(&["down"]).await?;
        }
        Ok(())
    }

    /// Kill every container, then bring the stack down with volumes.
    ///
    /// Kill failures are tolerated; `down` remains the failsafe that
    /// removes the network either way.
    pub async fn teardown(&self) -> Result<(), ComposeError> {
        info!("tearing down stack");
        for id in self.container_ids().await? {
            let args = vec!["container".to_owned(), "kill".to_owned(), id.clone()];
            match self.runner.run("docker", &args).await {
                Ok(output) if output.success() => {}
                Ok(output) => {
                    warn!(container = %id, stderr = %output.stderr.trim(), "kill failed")
                }
                Err(e) => warn!(container = %id, error = %e, "kill failed"),
            }
        }
        self.down(true).await
    }

    /// IDs of every container in the stack.
    pub async fn container_ids(&self) -> Result<Vec<String>, ComposeError> {
        let output = self.compose(&["ps", "--quiet"]).await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }

    /// The container backing a service, retried until compose reports one.
    pub async fn service_container(&self, service: &str) -> Result<String, ComposeError> {
        let retry = RetryBudget::new(self.start_timeout).with_poll_interval(self.poll_interval);
        let work = || async {
            match self.compose(&["ps", "--quiet", service]).await {
                Ok(output) => {
                    let id = output.stdout_trimmed();
                    if id.is_empty() {
                        Err(format!("no container yet for service '{service}'"))
                    } else {
                        Ok(id.to_owned())
                    }
                }
                Err(e) => Err(e.to_string()),
            }
        };

        match retry.run(work, |_| false).await {
            Ok(RetryOutcome::Completed(id)) => {
                info!(service, container = %id, "resolved service container");
                Ok(id)
            }
            Ok(RetryOutcome::Abandoned) | Err(_) => Err(ComposeError::ServiceNotFound {
                service: service.to_owned(),
                waited: self.start_timeout,
            }),
        }
    }

    /// Host endpoint of a published service port, cached per stack.
    pub async fn service_endpoint(
        &self,
        service: &str,
        port: u16,
    ) -> Result<ServiceEndpoint, ComposeError> {
        let key = (service.to_owned(), port);
        {
            let endpoints = self.endpoints.lock().await;
            if let Some(endpoint) = endpoints.get(&key) {
                return Ok(endpoint.clone());
            }
        }

        let output = self
            .compose(&["port", service, &port.to_string()])
            .await?;
        let endpoint = parse_endpoint(output.stdout_trimmed()).ok_or_else(|| {
            ComposeError::PortNotPublished {
                service: service.to_owned(),
                port,
            }
        })?;
        info!(service, port, endpoint = %endpoint, "resolved service endpoint");

        let mut endpoints = self.endpoints.lock().await;
        endpoints.insert(key, endpoint.clone());
        Ok(endpoint)
    }

    /// Run a command inside a service container (no TTY).
    pub async fn exec(&self, service: &str, argv: &[&str]) -> Result<CommandOutput, ComposeError> {
        let mut tail = vec!["exec", "--no-TTY", service];
        tail.extend_from_slice(argv);
        self.compose(&tail).await
    }
}

/// Parse compose `port` output like `0.0.0.0:49153`.
///
/// A wildcard host is rewritten to localhost so callers can connect to it.
fn parse_endpoint(raw: &str) -> Option<ServiceEndpoint> {
    let (host, port) = raw.rsplit_once(':')?;
    let port = port.parse().ok()?;
    let host = if host == "0.0.0.0" || host == "[::]" {
        "localhost"
    } else {
        host
    };
    if host.is_empty() {
        return None;
    }
    Some(ServiceEndpoint {
        host: host.to_owned(),
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::mock::MockRunner;

    fn stack(runner: MockRunner) -> ComposeStack<MockRunner> {
        ComposeStack::new(Arc::new(runner), "docker-compose.yml")
            .with_project_name("moorage-test")
            .with_start_timeout(Duration::from_millis(100))
            .with_poll_interval(Duration::from_millis(5))
    }

    #[test]
    fn parse_endpoint_rewrites_wildcard_host() {
        let endpoint = parse_endpoint("0.0.0.0:49153").unwrap();
        assert_eq!(endpoint.host, "localhost");
        assert_eq!(endpoint.port, 49153);
    }

    #[test]
    fn parse_endpoint_keeps_concrete_host() {
        let endpoint = parse_endpoint("127.0.0.1:8080").unwrap();
        assert_eq!(endpoint.host, "127.0.0.1");
        assert_eq!(endpoint.port, 8080);
    }

    #[test]
    fn parse_endpoint_rejects_garbage() {
        assert!(parse_endpoint("").is_none());
        assert!(parse_endpoint("no-port-here").is_none());
        assert!(parse_endpoint("host:not-a-port").is_none());
    }

    #[tokio::test]
    async fn up_builds_expected_command() {
        let runner = MockRunner::new().push_ok("");
        let stack = stack(runner);
        stack.up().await.unwrap();

        let calls = stack.runner.calls();
        assert_eq!(
            calls,
            vec![
                "docker compose --file docker-compose.yml --project-name moorage-test up --detach"
            ]
        );
    }

    #[tokio::test]
    async fn up_surfaces_compose_failure() {
        let runner = MockRunner::new().push_failure(1, "yaml: parse error");
        let stack = stack(runner);
        let err = stack.up().await.unwrap_err();
        match err {
            ComposeError::CommandFailed { status, stderr, .. } => {
                assert_eq!(status, 1);
                assert!(stderr.contains("parse error"));
            }
            other => panic!("expected command failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn down_with_volumes() {
        let runner = MockRunner::new().push_ok("");
        let stack = stack(runner);
        stack.down(true).await.unwrap();
        assert!(stack.runner.calls()[0].ends_with("down --volumes"));
    }

    #[tokio::test]
    async fn down_without_volumes() {
        let runner = MockRunner::new().push_ok("");
        let stack = stack(runner);
        stack.down(false).await.unwrap();
        assert!(stack.runner.calls()[0].ends_with("down"));
    }

    #[tokio::test]
    async fn container_ids_splits_lines() {
        let runner = MockRunner::new().push_ok("abc123\ndef456\n\n");
        let stack = stack(runner);
        let ids = stack.container_ids().await.unwrap();
        assert_eq!(ids, vec!["abc123".to_owned(), "def456".to_owned()]);
    }

    #[tokio::test]
    async fn service_container_retries_until_reported() {
        let runner = MockRunner::new().push_ok("").push_ok("").push_ok("abc123\n");
        let stack = stack(runner);
        let id = stack.service_container("orchestrator").await.unwrap();
        assert_eq!(id, "abc123");
        assert_eq!(stack.runner.call_count(), 3);
    }

    #[tokio::test]
    async fn service_container_times_out_to_service_not_found() {
        // Mock returns empty stdout forever.
        let runner = MockRunner::new();
        let stack = stack(runner);
        let err = stack.service_container("ghost").await.unwrap_err();
        match err {
            ComposeError::ServiceNotFound { service, waited } => {
                assert_eq!(service, "ghost");
                assert_eq!(waited, Duration::from_millis(100));
            }
            other => panic!("expected service-not-found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn service_endpoint_parses_and_caches() {
        let runner = MockRunner::new().push_ok("0.0.0.0:49153\n");
        let stack = stack(runner);

        let endpoint = stack.service_endpoint("api", 8080).await.unwrap();
        assert_eq!(endpoint.host, "localhost");
        assert_eq!(endpoint.port, 49153);

        // Second lookup is served from the cache: no further commands.
        let again = stack.service_endpoint("api", 8080).await.unwrap();
        assert_eq!(again, endpoint);
        assert_eq!(stack.runner.call_count(), 1);
    }

    #[tokio::test]
    async fn service_endpoint_unpublished_port() {
        let runner = MockRunner::new().push_ok("\n");
        let stack = stack(runner);
        let err = stack.service_endpoint("orchestrator", 9999).await.unwrap_err();
        assert!(matches!(err, ComposeError::PortNotPublished { .. }));
    }

    #[tokio::test]
    async fn exec_runs_without_tty() {
        let runner = MockRunner::new().push_ok("pg_trgm\npgcrypto\n");
        let stack = stack(runner);
        let output = stack
            .exec("postgres", &["psql", "--command", "SELECT 1"])
            .await
            .unwrap();
        assert!(output.stdout.contains("pg_trgm"));
        assert!(stack.runner.calls()[0].contains("exec --no-TTY postgres psql"));
    }

    #[tokio::test]
    async fn teardown_kills_then_downs() {
        let runner = MockRunner::new()
            .push_ok("abc123\n") // ps --quiet
            .push_ok("") // kill abc123
            .push_ok(""); // down --volumes
        let stack = stack(runner);
        stack.teardown().await.unwrap();

        let calls = stack.runner.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].contains("ps --quiet"));
        assert_eq!(calls[1], "docker container kill abc123");
        assert!(calls[2].ends_with("down --volumes"));
    }

    #[tokio::test]
    async fn teardown_tolerates_kill_failure() {
        let runner = MockRunner::new()
            .push_ok("abc123\n")
            .push_failure(1, "no such container")
            .push_ok("");
        let stack = stack(runner);
        stack.teardown().await.unwrap();
        assert_eq!(stack.runner.call_count(), 3);
    }
}
