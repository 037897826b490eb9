//! CLI argument parsing using clap derive API
//!
//! Purely declarative; no side effects or I/O here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Moorage -- compose stack test harness.
///
/// Use `moorage <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "moorage", version, about, long_about = None)]
pub struct Cli {
    /// Path to the moorage.toml configuration file.
    #[arg(short, long, default_value = "moorage.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring the stack up and wait for it to converge.
    Up(UpArgs),

    /// Wait for the stack (or named services) to become healthy.
    Wait(WaitArgs),

    /// Probe every stack container once and report its condition.
    Status(StatusArgs),

    /// Dump container logs.
    Logs(LogsArgs),

    /// Bring the stack down.
    Down(DownArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- up ----

/// Bring the stack up and converge on health.
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Skip health convergence after `compose up`.
    #[arg(long)]
    pub no_wait: bool,

    /// Replace every derived per-container budget with this timeout.
    #[arg(long)]
    pub timeout: Option<u64>,
}

// ---- wait ----

/// Wait for health convergence without touching the stack.
#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Services to wait for (default: every health-checked container).
    pub services: Vec<String>,

    /// Replace every derived per-container budget with this timeout.
    #[arg(long)]
    pub timeout: Option<u64>,
}

// ---- status ----

/// Report each container's state, health, restarts, and uptime.
#[derive(Args, Debug)]
pub struct StatusArgs {}

// ---- logs ----

/// Dump container logs with per-container banners.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Services to dump (default: every stack container).
    pub services: Vec<String>,
}

// ---- down ----

/// Tear the stack down.
#[derive(Args, Debug)]
pub struct DownArgs {
    /// Also remove named volumes.
    #[arg(long)]
    pub volumes: bool,

    /// Kill containers before `down` instead of stopping gracefully.
    #[arg(long)]
    pub kill: bool,
}

// ---- config ----

/// Manage moorage configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, compose, converge).
        #[arg(long)]
        section: Option<String>,
    },
}
