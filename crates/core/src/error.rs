//! Error taxonomy for the harness.

/// Top-level moorage error.
#[derive(Debug, thiserror::Error)]
pub enum MoorageError {
    /// Configuration loading or validation failure.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Compose / container-runtime command failure.
    #[error("stack error: {0}")]
    Stack(#[from] StackError),

    /// Health-convergence failure.
    #[error("health error: {0}")]
    Health(#[from] HealthError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// The configuration file is not valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// A field holds a value outside its allowed range.
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Compose and container-runtime command errors.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// An external command exited non-zero.
    #[error("command '{command}' failed with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    /// An external command could not be spawned or timed out.
    #[error("command '{command}' did not complete: {reason}")]
    CommandAborted { command: String, reason: String },

    /// Compose never produced a container for the service.
    #[error("no container for service '{0}'")]
    ServiceNotFound(String),

    /// The service does not publish the requested port.
    #[error("service '{service}' does not publish port {port}")]
    PortNotPublished { service: String, port: u16 },

    /// Command output could not be interpreted.
    #[error("unparseable command output: {0}")]
    Parse(String),
}

/// Health-convergence errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    /// The container declares no health check; it can never be waited on.
    #[error("service '{0}' has no health check")]
    NoHealthCheck(String),

    /// The container stopped while being waited on.
    #[error("service '{0}' exited")]
    Exited(String),

    /// The container disappeared while being waited on.
    #[error("service '{0}' no longer exists")]
    Vanished(String),

    /// The wait budget ran out before the container became healthy.
    #[error("service '{service}' not healthy after {elapsed_secs}s (last status: {last_status})")]
    Timeout {
        service: String,
        elapsed_secs: u64,
        last_status: String,
    },

    /// The container runtime could not be queried.
    #[error("inspect failed: {0}")]
    Inspect(String),
}
