//! Container log capture for diagnostics.
//!
//! After a failed convergence the harness dumps every container's logs so
//! the offending service can be diagnosed from CI output alone. Logs are
//! written to any `Write` sink with a banner per container.

use std::io::Write;
use std::sync::Arc;

use tracing::warn;

use crate::error::ComposeError;
use crate::runner::CommandRunner;

const BANNER_WIDTH: usize = 80;

/// Emits `docker logs` output for containers.
pub struct LogEmitter<R: CommandRunner> {
    runner: Arc<R>,
}

impl<R: CommandRunner> LogEmitter<R> {
    /// Create an emitter over a shared runner.
    pub fn new(runner: Arc<R>) -> Self {
        Self { runner }
    }

    /// The container's name, without the leading slash Docker adds.
    pub async fn container_name(&self, id: &str) -> Result<String, ComposeError> {
        let args = vec![
            "inspect".to_owned(),
            id.to_owned(),
            "--format".to_owned(),
            "{{.Name}}".to_owned(),
        ];
        let output = self.runner.run("docker", &args).await?;
        if !output.success() {
            return Err(ComposeError::CommandFailed {
                command: format!("docker inspect {id}"),
                status: output.status,
                stderr: output.stderr.trim().to_owned(),
            });
        }
        Ok(output.stdout_trimmed().trim_start_matches('/').to_owned())
    }

    /// Write one container's logs to the sink, banner first.
    pub async fn emit_one(
        &self,
        id: &str,
        sink: &mut (dyn Write + Send),
    ) -> Result<(), ComposeError> {
        let name = self
            .container_name(id)
            .await
            .unwrap_or_else(|_| id.to_owned());
        writeln!(sink, "{}", "*".repeat(BANNER_WIDTH))?;
        writeln!(sink, "Container logs for {name} / {id}")?;
        writeln!(sink, "{}", "*".repeat(BANNER_WIDTH))?;

        let args = vec![
            "logs".to_owned(),
            "--details".to_owned(),
            "--timestamps".to_owned(),
            id.to_owned(),
        ];
        let output = self.runner.run("docker", &args).await?;
        sink.write_all(output.stdout.as_bytes())?;
        sink.write_all(output.stderr.as_bytes())?;
        Ok(())
    }

    /// Write every container's logs to the sink.
    ///
    /// One unreadable container does not stop the rest; its failure is
    /// logged and skipped.
    pub async fn emit_all(
        &self,
        ids: &[String],
        sink: &mut (dyn Write + Send),
    ) -> Result<(), ComposeError> {
        for id in ids {
            if let Err(e) = self.emit_one(id, sink).await {
                warn!(container = %id, error = %e, "could not emit container logs");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::mock::MockRunner;

    #[tokio::test]
    async fn container_name_strips_leading_slash() {
        let runner = Arc::new(MockRunner::new().push_ok("/stack_api_1\n"));
        let emitter = LogEmitter::new(Arc::clone(&runner));
        let name = emitter.container_name("abc123").await.unwrap();
        assert_eq!(name, "stack_api_1");
        assert!(runner.calls()[0].contains("inspect abc123"));
    }

    #[tokio::test]
    async fn container_name_failure_is_error() {
        let runner = Arc::new(MockRunner::new().push_failure(1, "no such object"));
        let emitter = LogEmitter::new(runner);
        let err = emitter.container_name("abc123").await.unwrap_err();
        assert!(matches!(err, ComposeError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn emit_one_writes_banner_and_logs() {
        let runner = Arc::new(
            MockRunner::new()
                .push_ok("/stack_db_1\n")
                .push_ok("2024-01-01T00:00:00Z db started\n"),
        );
        let emitter = LogEmitter::new(runner);

        let mut sink = Vec::new();
        emitter.emit_one("abc123", &mut sink).await.unwrap();

        let text = String::from_utf8(sink).unwrap();
        assert!(text.contains(&"*".repeat(BANNER_WIDTH)));
        assert!(text.contains("Container logs for stack_db_1 / abc123"));
        assert!(text.contains("db started"));
    }

    #[tokio::test]
    async fn emit_one_falls_back_to_id_when_name_unavailable() {
        let runner = Arc::new(
            MockRunner::new()
                .push_failure(1, "no such object")
                .push_ok("some log line\n"),
        );
        let emitter = LogEmitter::new(runner);

        let mut sink = Vec::new();
        emitter.emit_one("abc123", &mut sink).await.unwrap();

        let text = String::from_utf8(sink).unwrap();
        assert!(text.contains("Container logs for abc123 / abc123"));
    }

    #[tokio::test]
    async fn emit_all_covers_every_container() {
        let runner = Arc::new(
            MockRunner::new()
                .push_ok("/one\n")
                .push_ok("first logs\n")
                .push_ok("/two\n")
                .push_ok("second logs\n"),
        );
        let emitter = LogEmitter::new(runner);

        let mut sink = Vec::new();
        emitter
            .emit_all(&["aaa".to_owned(), "bbb".to_owned()], &mut sink)
            .await
            .unwrap();

        let text = String::from_utf8(sink).unwrap();
        assert!(text.contains("first logs"));
        assert!(text.contains("second logs"));
        assert!(text.contains("Container logs for one / aaa"));
        assert!(text.contains("Container logs for two / bbb"));
    }
}
