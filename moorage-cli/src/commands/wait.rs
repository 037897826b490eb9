//! `moorage wait` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use moorage_converge::ConvergenceReport;
use moorage_core::config::MoorageConfig;

use crate::cli::WaitArgs;
use crate::commands::{build_coordinator, build_inspector, build_runner, build_stack};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `wait` command.
///
/// With no services, waits on every health-checked container in the
/// stack; with names, resolves each to its container first.
pub async fn execute(
    args: WaitArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = MoorageConfig::load(config_path).await?;
    let inspector = build_inspector(&config)?;
    let coordinator = build_coordinator(inspector, &config, args.timeout);

    let report = if args.services.is_empty() {
        coordinator.await_stack_healthy().await?
    } else {
        let stack = build_stack(&config, build_runner(&config));
        let mut containers = Vec::with_capacity(args.services.len());
        for service in &args.services {
            containers.push(stack.service_container(service).await?);
        }
        coordinator.await_healthy(&containers).await?
    };

    writer.render(&WaitReport::from(report))
}

#[derive(Serialize)]
pub struct WaitReport {
    pub operation_id: String,
    pub healthy: Vec<String>,
    pub elapsed_secs: u64,
}

impl From<ConvergenceReport> for WaitReport {
    fn from(report: ConvergenceReport) -> Self {
        Self {
            operation_id: report.operation_id.to_string(),
            healthy: report.healthy,
            elapsed_secs: report.elapsed.as_secs(),
        }
    }
}

impl Render for WaitReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "{}: {} service(s) in {}s",
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
