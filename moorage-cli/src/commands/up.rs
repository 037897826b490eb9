//! `moorage up` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use moorage_compose::{ComposeStack, LogEmitter, ProcessRunner};
use moorage_core::config::MoorageConfig;

use crate::cli::UpArgs;
use crate::commands::{build_coordinator, build_inspector, build_runner, build_stack};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `up` command: compose up, then converge.
pub async fn execute(
    args: UpArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = MoorageConfig::load(config_path).await?;
    let runner = build_runner(&config);
    let stack = build_stack(&config, Arc::clone(&runner));

    stack.up().await?;

    if args.no_wait {
        return writer.render(&UpReport {
            converged: false,
            healthy: Vec::new(),
            elapsed_secs: 0,
        });
    }

    let inspector = build_inspector(&config)?;
    let coordinator = build_coordinator(inspector, &config, args.timeout);
    match coordinator.await_stack_healthy().await {
        Ok(report) => writer.render(&UpReport {
            converged: true,
            healthy: report.healthy,
            elapsed_secs: report.elapsed.as_secs(),
        }),
        Err(err) => {
            // Dump container logs before failing so the cause is visible
            // from CI output alone.
            dump_stack_logs(&stack, Arc::clone(&runner)).await;
            Err(err.into())
        }
    }
}

async fn dump_stack_logs(stack: &ComposeStack<ProcessRunner>, runner: Arc<ProcessRunner>) {
    let ids = match stack.container_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            warn!(error = %e, "could not list containers for log dump");
            return;
        }
    };
    let emitter = LogEmitter::new(runner);
    let mut stdout = std::io::stdout();
    if let Err(e) = emitter.emit_all(&ids, &mut stdout).await {
        warn!(error = %e, "could not emit container logs");
    }
}

#[derive(Serialize)]
pub struct UpReport {
    pub converged: bool,
    pub healthy: Vec<String>,
    pub elapsed_secs: u64,
}

impl Render for UpReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if !self.converged {
            writeln!(w, "Stack is up ({})", "health not awaited".yellow())?;
            return Ok(());
        }
        writeln!(
            w,
            "Stack is up and {} ({} service(s) in {}s)",
            "healthy".green().bold(),
            self.healthy.len(),
            self.elapsed_secs
        )?;
        for service in &self.healthy {
            writeln!(w, "  {service}")?;
        }
        Ok(())
    }
}
