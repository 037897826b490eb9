//! `moorage down` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use moorage_core::config::MoorageConfig;

use crate::cli::DownArgs;
use crate::commands::{build_runner, build_stack};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `down` command.
///
/// `--kill` kills each container first and always removes volumes, the
/// way a test teardown does; otherwise containers stop gracefully.
pub async fn execute(
    args: DownArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = MoorageConfig::load(config_path).await?;
    let stack = build_stack(&config, build_runner(&config));

    if args.kill {
        stack.teardown().await?;
    } else {
        stack.down(args.volumes).await?;
    }

    writer.render(&DownReport {
        killed: args.kill,
        removed_volumes: args.volumes || args.kill,
    })
}

#[derive(Serialize)]
pub struct DownReport {
    pub killed: bool,
    pub removed_volumes: bool,
}

impl Render for DownReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let how = if self.killed { "killed" } else { "stopped" };
        let volumes = if self.removed_volumes {
            ", volumes removed"
        } else {
            ""
        };
        writeln!(w, "Stack is down ({how}{volumes})")
    }
}
