//! Subcommand handlers and shared wiring.

pub mod config;
pub mod down;
pub mod logs;
pub mod status;
pub mod up;
pub mod wait;

use std::sync::Arc;
use std::time::Duration;

use moorage_compose::{ComposeStack, ProcessRunner};
use moorage_converge::{BollardInspector, ConvergenceCoordinator};
use moorage_core::config::MoorageConfig;

use crate::error::CliError;

/// Command runner sized by the configured per-command timeout.
pub(crate) fn build_runner(config: &MoorageConfig) -> Arc<ProcessRunner> {
    Arc::new(ProcessRunner::new(Duration::from_secs(
        config.compose.command_timeout_secs,
    )))
}

/// Compose stack wired from configuration.
pub(crate) fn build_stack(
    config: &MoorageConfig,
    runner: Arc<ProcessRunner>,
) -> ComposeStack<ProcessRunner> {
    let mut stack = ComposeStack::new(runner, config.compose.compose_file.clone())
        .with_start_timeout(Duration::from_secs(
            config.compose.service_start_timeout_secs,
        ));
    if let Some(project) = effective_project_name(config) {
        stack = stack.with_project_name(project);
    }
    stack
}

/// Docker inspector scoped to the compose project.
pub(crate) fn build_inspector(config: &MoorageConfig) -> Result<Arc<BollardInspector>, CliError> {
    let mut inspector = BollardInspector::connect_with_socket(&config.compose.docker_socket)?;
    if let Some(project) = effective_project_name(config) {
        inspector = inspector.with_project(project);
    }
    Ok(Arc::new(inspector))
}

/// Coordinator wired from configuration; a CLI timeout flag beats the
/// configured override.
pub(crate) fn build_coordinator(
    inspector: Arc<BollardInspector>,
    config: &MoorageConfig,
    timeout_flag: Option<u64>,
) -> ConvergenceCoordinator<BollardInspector> {
    let mut coordinator = ConvergenceCoordinator::new(inspector)
        .with_poll_interval(Duration::from_secs(config.converge.poll_interval_secs));
    if let Some(secs) = timeout_flag.or(config.converge.timeout_override_secs) {
        coordinator = coordinator.with_timeout_override(Duration::from_secs(secs));
    }
    coordinator
}

/// The compose project name: configured, or derived from the working
/// directory the way compose derives its default.
pub(crate) fn effective_project_name(config: &MoorageConfig) -> Option<String> {
    if !config.compose.project_name.is_empty() {
        return Some(config.compose.project_name.clone());
    }
    std::env::current_dir()
        .ok()?
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_project_name_wins() {
        let mut config = MoorageConfig::default();
        config.compose.project_name = "harness".to_owned();
        assert_eq!(
            effective_project_name(&config),
            Some("harness".to_owned())
        );
    }

    #[test]
    fn empty_project_name_derives_from_cwd() {
        let config = MoorageConfig::default();
        let derived = effective_project_name(&config).expect("cwd should have a name");
        assert!(!derived.is_empty());
        assert_eq!(derived, derived.to_lowercase());
    }
}
