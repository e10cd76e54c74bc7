use std::path::PathBuf;
use thiserror::Error;

use crate::infrastructure::process::CommandExecutorError;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Required tool '{tool}' was not found on PATH. {hint}")]
    MissingDependency { tool: String, hint: String },

    #[error("Invalid usage: {message}")]
    Usage { message: String },

    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {field} - {message}")]
    ValidationError {
        field: String,
        message: String,
        value: Option<String>,
    },

    #[error("Command execution failed: {message}")]
    CommandError {
        message: String,
        command: String,
        exit_code: Option<i32>,
        stderr: Option<String>,
    },

    #[error("File system operation failed: {message}")]
    FileSystemError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Serialization error: {message}")]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Command '{command}' timed out after {timeout_secs} seconds")]
    Timeout { command: String, timeout_secs: u64 },
}

impl ProvisionError {
    pub fn missing_dependency(tool: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingDependency {
            tool: tool.into(),
            hint: hint.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn validation_error(
        field: impl Into<String>,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
            value,
        }
    }

    /// A command ran and exited unsuccessfully. `command` must already be masked.
    pub fn command_failed(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        let command = command.into();
        let stderr = stderr.into();
        let stderr = stderr.trim();
        let message = match (exit_code, stderr.is_empty()) {
            (Some(code), true) => format!("'{}' exited with status {}", command, code),
            (Some(code), false) => {
                format!("'{}' exited with status {}: {}", command, code, stderr)
            }
            (None, true) => format!("'{}' was terminated by a signal", command),
            (None, false) => format!("'{}' was terminated by a signal: {}", command, stderr),
        };
        Self::CommandError {
            message,
            command,
            exit_code,
            stderr: (!stderr.is_empty()).then(|| stderr.to_string()),
        }
    }

    pub fn command_error(message: impl Into<String>, command: impl Into<String>) -> Self {
        Self::CommandError {
            message: message.into(),
            command: command.into(),
            exit_code: None,
            stderr: None,
        }
    }

    pub fn filesystem_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn filesystem_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: Some(source),
        }
    }

    pub fn serialization_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn timeout(command: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            command: command.into(),
            timeout_secs,
        }
    }
}

impl From<std::io::Error> for ProvisionError {
    fn from(error: std::io::Error) -> Self {
        Self::filesystem_error_with_source("File system operation failed", None, error)
    }
}

impl From<serde_yaml::Error> for ProvisionError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::serialization_error_with_source("YAML deserialization failed", error)
    }
}

impl From<serde_json::Error> for ProvisionError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization_error_with_source("JSON deserialization failed", error)
    }
}

impl From<validator::ValidationErrors> for ProvisionError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::config_error_with_source("Invalid configuration", errors)
    }
}

impl From<CommandExecutorError> for ProvisionError {
    fn from(error: CommandExecutorError) -> Self {
        match error {
            CommandExecutorError::ProgramNotFound { program } => {
                let hint = format!("Install '{}' and make sure it is on PATH.", program);
                Self::missing_dependency(program, hint)
            }
            CommandExecutorError::Timeout {
                command,
                timeout_seconds,
            } => Self::timeout(command, timeout_seconds),
            CommandExecutorError::SpawnFailed { command, source } => Self::CommandError {
                message: format!("failed to start '{}': {}", command, source),
                command,
                exit_code: None,
                stderr: None,
            },
            CommandExecutorError::IoError { command, source } => Self::CommandError {
                message: format!("I/O error while running '{}': {}", command, source),
                command,
                exit_code: None,
                stderr: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_message() {
        let error = ProvisionError::missing_dependency("az", "See https://aka.ms/installazurecli");
        assert_eq!(
            error.to_string(),
            "Required tool 'az' was not found on PATH. See https://aka.ms/installazurecli"
        );
    }

    #[test]
    fn test_command_failed_includes_stderr() {
        let error = ProvisionError::command_failed(
            "az group delete --name rg-demo-alice --yes",
            Some(3),
            "ResourceGroupNotFound\n",
        );
        assert_eq!(
            error.to_string(),
            "Command execution failed: 'az group delete --name rg-demo-alice --yes' exited with status 3: ResourceGroupNotFound"
        );
        if let ProvisionError::CommandError {
            exit_code, stderr, ..
        } = error
        {
            assert_eq!(exit_code, Some(3));
            assert_eq!(stderr.as_deref(), Some("ResourceGroupNotFound"));
        } else {
            panic!("Expected CommandError");
        }
    }

    #[test]
    fn test_command_failed_without_stderr() {
        let error = ProvisionError::command_failed("gh auth login", Some(1), "   ");
        assert_eq!(
            error.to_string(),
            "Command execution failed: 'gh auth login' exited with status 1"
        );
    }

    #[test]
    fn test_program_not_found_becomes_missing_dependency() {
        let error: ProvisionError = CommandExecutorError::ProgramNotFound {
            program: "whoami".to_string(),
        }
        .into();
        assert!(matches!(error, ProvisionError::MissingDependency { ref tool, .. } if tool == "whoami"));
    }

    #[test]
    fn test_timeout_conversion() {
        let error: ProvisionError = CommandExecutorError::Timeout {
            command: "az login".to_string(),
            timeout_seconds: 30,
        }
        .into();
        assert_eq!(
            error.to_string(),
            "Command 'az login' timed out after 30 seconds"
        );
    }

    #[test]
    fn test_error_conversion_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ProvisionError = io_error.into();
        assert!(matches!(error, ProvisionError::FileSystemError { .. }));
    }
}
