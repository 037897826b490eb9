//! `moorage status` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use moorage_compose::LogEmitter;
use moorage_converge::HealthProbe;
use moorage_core::config::MoorageConfig;

use crate::cli::StatusArgs;
use crate::commands::{build_inspector, build_runner, build_stack};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `status` command: one probe per container, no waiting.
pub async fn execute(
    _args: StatusArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = MoorageConfig::load(config_path).await?;
    let runner = build_runner(&config);
    let stack = build_stack(&config, Arc::clone(&runner));
    let inspector = build_inspector(&config)?;
    let probe = HealthProbe::new(inspector);
    let emitter = LogEmitter::new(runner);

    let mut containers = Vec::new();
    for id in stack.container_ids().await? {
        let name = emitter
            .container_name(&id)
            .await
            .unwrap_or_else(|_| short_id(&id).to_owned());
        let row = match probe.snapshot(&id).await {
            Ok(snapshot) => ContainerRow {
                name,
                id: short_id(&id).to_owned(),
                state: snapshot.state.to_string(),
                health: snapshot.status.to_string(),
                restarts: snapshot.restart_count,
                uptime_secs: snapshot.uptime.as_secs(),
            },
            Err(e) => {
                debug!(container = %id, error = %e, "container gone during status");
                ContainerRow {
                    name,
                    id: short_id(&id).to_owned(),
                    state: "gone".to_owned(),
                    health: "probe-error".to_owned(),
                    restarts: 0,
                    uptime_secs: 0,
                }
            }
        };
        containers.push(row);
    }

    writer.render(&StatusReport { containers })
}

fn short_id(id: &str) -> &str {
    &id[..12.min(id.len())]
}

#[derive(Serialize)]
pub struct StatusReport {
    pub containers: Vec<ContainerRow>,
}

#[derive(Serialize)]
pub struct ContainerRow {
    pub name: String,
    pub id: String,
    pub state: String,
    pub health: String,
    pub restarts: u64,
    pub uptime_secs: u64,
}

impl Render for StatusReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.containers.is_empty() {
            writeln!(w, "No containers in the stack")?;
            return Ok(());
        }

        writeln!(
            w,
            "{:<30} {:<14} {:<12} {:<14} {:<9} Uptime",
            "Name", "ID", "State", "Health", "Restarts"
        )?;
        writeln!(w, "{}", "-".repeat(92))?;

        for row in &self.containers {
            let health = match row.health.as_str() {
                "healthy" => row.health.green(),
                "unhealthy" | "exited" => row.health.red(),
                _ => row.health.yellow(),
            };
            writeln!(
                w,
                "{:<30} {:<14} {:<12} {:<14} {:<9} {}s",
                row.name, row.id, row.state, health, row.restarts, row.uptime_secs
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> ContainerRow {
        ContainerRow {
            name: "stack_api_1".to_owned(),
            id: "abc123def456".to_owned(),
            state: "running".to_owned(),
            health: "healthy".to_owned(),
            restarts: 0,
            uptime_secs: 125,
        }
    }

    #[test]
    fn short_id_truncates_long_ids() {
        let full = "a".repeat(64);
        assert_eq!(short_id(&full).len(), 12);
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn render_status_table() {
        let report = StatusReport {
            containers: vec![sample_row()],
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.contains("stack_api_1"));
        assert!(text.contains("abc123def456"));
        assert!(text.contains("running"));
        assert!(text.contains("125s"));
    }

    #[test]
    fn render_empty_status() {
        let report = StatusReport {
            containers: Vec::new(),
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.contains("No containers"));
    }

    #[test]
    fn report_serializes() {
        let report = StatusReport {
            containers: vec![sample_row()],
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["containers"][0]["health"], "healthy");
        assert_eq!(json["containers"][0]["uptime_secs"], 125);
    }
}
