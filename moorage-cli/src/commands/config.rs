//! `moorage config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use moorage_core::config::MoorageConfig;

use crate::cli::ConfigAction;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    action: ConfigAction,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match action {
        ConfigAction::Validate => {
            MoorageConfig::load(config_path).await?;
            writer.render(&ValidateReport {
                path: config_path.display().to_string(),
                valid: true,
            })
        }
        ConfigAction::Show { section } => {
            let config = MoorageConfig::load(config_path).await?;
            let rendered = render_section(&config, section.as_deref())?;
            writer.render(&ShowReport { section, rendered })
        }
    }
}

/// Serialize the whole config or one named section as TOML.
fn render_section(config: &MoorageConfig, section: Option<&str>) -> Result<String, CliError> {
    let result = match section {
        None => toml::to_string(config),
        Some("general") => toml::to_string(&config.general),
        Some("compose") => toml::to_string(&config.compose),
        Some("converge") => toml::to_string(&config.converge),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown config section '{other}' (expected general, compose, converge)"
            )));
        }
    };
    result.map_err(|e| CliError::Command(format!("could not render config: {e}")))
}

#[derive(Serialize)]
pub struct ValidateReport {
    pub path: String,
    pub valid: bool,
}

impl Render for ValidateReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}: configuration OK", self.path)
    }
}

#[derive(Serialize)]
pub struct ShowReport {
    pub section: Option<String>,
    pub rendered: String,
}

impl Render for ShowReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        write!(w, "{}", self.rendered)
    }
}
