//! Error types for tgo
//!
//! All modules use `TgoResult<T>` as their return type.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for tgo operations
pub type TgoResult<T> = Result<T, TgoError>;

/// All errors that can occur in tgo
#[derive(Error, Debug)]
pub enum TgoError {
    // Configuration errors
    #[error("Invalid cache record at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Toolchain errors
    #[error("Dependency enumeration failed: {0}")]
    Enumeration(String),

    // Process errors
    #[error("Command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command exited with code {code}: {command}")]
    ProcessExit { command: String, code: i32 },

    #[error("Process terminated by signal: {0}")]
    ProcessSignaled(String),

    #[error("Invalid command line: {0}")]
    CommandLine(String),

    #[error("Program not found on PATH: {0}")]
    ProgramNotFound(String),

    // Cache errors
    #[error("Refusing to remove {target}: outside of cache directory {scope}")]
    ScopeViolation { target: PathBuf, scope: PathBuf },

    #[error("Cache initialization failed: {0}")]
    InitFailed(Arc<TgoError>),

    // Serialization errors
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TgoError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a config invalid error
    pub fn config_invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Exit code of the child process, if this error came from one
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ProcessExit { code, .. } => Some(*code),
            Self::InitFailed(inner) => inner.exit_code(),
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Run: tgo clean"),
            Self::Enumeration(_) => Some("Check that `go list all ./...` succeeds in this workspace"),
            Self::InitFailed(inner) => inner.hint(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TgoError::ProcessExit {
            command: "go build ./...".to_string(),
            code: 2,
        };
        assert!(err.to_string().contains("exited with code 2"));
    }

    #[test]
    fn error_hint() {
        let err = TgoError::config_invalid("/w/.tgo/config.toml", "missing field `pkgdir`");
        assert_eq!(err.hint(), Some("Run: tgo clean"));
    }

    #[test]
    fn exit_code_through_init_failure() {
        let inner = TgoError::ProcessExit {
            command: "go list".to_string(),
            code: 7,
        };
        let err = TgoError::InitFailed(Arc::new(inner));
        assert_eq!(err.exit_code(), Some(7));
        assert_eq!(TgoError::Enumeration("x".into()).exit_code(), None);
    }
}
