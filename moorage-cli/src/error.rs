//! CLI-specific error types and exit code mapping

use moorage_compose::ComposeError;
use moorage_converge::ConvergeError;
use moorage_core::error::MoorageError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-facing message; the
/// `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// A compose / docker command failed.
    #[error("stack error: {0}")]
    Stack(String),

    /// The stack never converged to healthy.
    #[error("convergence failed: {0}")]
    Converge(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from moorage-core.
    #[error("{0}")]
    Core(#[from] MoorageError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                    |
    /// |------|----------------------------|
    /// | 0    | Success                    |
    /// | 1    | General / command error    |
    /// | 2    | Configuration error        |
    /// | 3    | Stack command failure      |
    /// | 4    | Convergence failure        |
    /// | 10   | IO error                   |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(MoorageError::Config(_)) => 2,
            Self::Stack(_) | Self::Core(MoorageError::Stack(_)) => 3,
            Self::Converge(_) | Self::Core(MoorageError::Health(_)) => 4,
            Self::Io(_) | Self::Core(MoorageError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<ComposeError> for CliError {
    fn from(e: ComposeError) -> Self {
        Self::Stack(e.to_string())
    }
}

impl From<ConvergeError> for CliError {
    fn from(e: ConvergeError) -> Self {
        Self::Converge(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moorage_core::error::{ConfigError, HealthError, StackError};

    #[test]
    fn exit_code_config() {
        assert_eq!(CliError::Config("bad".to_owned()).exit_code(), 2);
        let core: MoorageError = ConfigError::ParseFailed {
            reason: "bad".to_owned(),
        }
        .into();
        assert_eq!(CliError::Core(core).exit_code(), 2);
    }

    #[test]
    fn exit_code_stack() {
        assert_eq!(CliError::Stack("compose".to_owned()).exit_code(), 3);
        let core: MoorageError = StackError::ServiceNotFound("db".to_owned()).into();
        assert_eq!(CliError::Core(core).exit_code(), 3);
    }

    #[test]
    fn exit_code_converge() {
        assert_eq!(CliError::Converge("unhealthy".to_owned()).exit_code(), 4);
        let core: MoorageError = HealthError::NoHealthCheck("db".to_owned()).into();
        assert_eq!(CliError::Core(core).exit_code(), 4);
    }

    #[test]
    fn exit_code_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        assert_eq!(CliError::Io(io).exit_code(), 10);
    }

    #[test]
    fn exit_code_general() {
        assert_eq!(CliError::Command("oops".to_owned()).exit_code(), 1);
    }

    #[test]
    fn from_compose_error_is_stack() {
        let err: CliError = ComposeError::PortNotPublished {
            service: "db".to_owned(),
            port: 5432,
        }
        .into();
        assert!(matches!(err, CliError::Stack(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn from_converge_error_is_converge() {
        let err: CliError = ConvergeError::NoHealthCheck {
            service: "db".to_owned(),
        }
        .into();
        assert!(matches!(err, CliError::Converge(_)));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn display_preserves_context() {
        let err = CliError::Converge("service 'db' exited".to_owned());
        let msg = err.to_string();
        assert!(msg.contains("convergence failed"));
        assert!(msg.contains("service 'db' exited"));
    }
}
