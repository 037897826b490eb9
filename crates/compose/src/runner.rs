//! External command execution.
//!
//! Everything the harness runs on the host (`docker`, `docker compose`)
//! goes through the [`CommandRunner`] trait so tests can script responses
//! without a Docker daemon. [`ProcessRunner`] is the production
//! implementation over `tokio::process`.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::ComposeError;

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit status, -1 when terminated by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Stdout without surrounding whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Runs host commands; mockable in tests.
pub trait CommandRunner: Send + Sync + 'static {
    /// Run `program` with `args`, capturing output.
    ///
    /// A non-zero exit is NOT an error at this layer; callers decide
    /// which commands tolerate failure.
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = Result<CommandOutput, ComposeError>> + Send;
}

/// Production runner over `tokio::process::Command`.
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    /// Create a runner with a per-command timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Render a command line for logs and error messages.
fn render(program: &str, args: &[String]) -> String {
    let mut rendered = String::from(program);
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ComposeError> {
        let rendered = render(program, args);
        debug!(command = %rendered, "running command");

        let output = tokio::time::timeout(
            self.timeout,
            tokio::process::Command::new(program)
                .args(args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ComposeError::CommandAborted {
            command: rendered.clone(),
            reason: format!("timed out after {}s", self.timeout.as_secs()),
        })?
        .map_err(|e| ComposeError::CommandAborted {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;

        let result = CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            command = %rendered,
            status = result.status,
            stdout_bytes = result.stdout.len(),
            "command finished"
        );
        Ok(result)
    }
}
