//! `moorage logs` command handler

use std::path::Path;
use std::sync::Arc;

use moorage_compose::LogEmitter;
use moorage_core::config::MoorageConfig;

use crate::cli::LogsArgs;
use crate::commands::{build_runner, build_stack};
use crate::error::CliError;

/// Execute the `logs` command: dump container logs to stdout.
///
/// Log dumps are raw diagnostics, so they bypass the output writer.
pub async fn execute(args: LogsArgs, config_path: &Path) -> Result<(), CliError> {
    let config = MoorageConfig::load(config_path).await?;
    let runner = build_runner(&config);
    let stack = build_stack(&config, Arc::clone(&runner));

    let containers = if args.services.is_empty() {
        stack.container_ids().await?
    } else {
        let mut ids = Vec::with_capacity(args.services.len());
        for service in &args.services {
            ids.push(stack.service_container(service).await?);
        }
        ids
    };

    let emitter = LogEmitter::new(runner);
    let mut stdout = std::io::stdout();
    emitter.emit_all(&containers, &mut stdout).await?;
    Ok(())
}
