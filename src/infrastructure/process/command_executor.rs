use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use super::command_spec::{CommandSpec, OutputMode};

/// Command executor errors
#[derive(Debug, Error)]
pub enum CommandExecutorError {
    #[error("Program not found: {program}")]
    ProgramNotFound { program: String },

    #[error("Command '{command}' timed out after {timeout_seconds} seconds")]
    Timeout {
        command: String,
        timeout_seconds: u64,
    },

    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error while running '{command}': {source}")]
    IoError {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code of the process, `None` if it was killed by a signal
    pub exit_code: Option<i32>,

    /// Standard output (empty when not captured)
    pub stdout: String,

    /// Standard error output (empty when not captured)
    pub stderr: String,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,

    /// Whether the command was successful (exit code 0)
    pub success: bool,
}

impl ExecutionResult {
    pub fn new(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            success: exit_code == Some(0),
            exit_code,
            stdout,
            stderr,
            execution_time_ms,
        }
    }

    /// A successful run with the given stdout
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self::new(Some(0), stdout.into(), String::new(), 0)
    }

    /// Trimmed stdout, for `-o tsv` style single values
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Seam between the use cases and the operating system.
///
/// Implementations run exactly one command and report how it ended; they do
/// not interpret exit codes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult, CommandExecutorError>;
}

/// Runs commands as child processes through tokio
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill and fail any command running longer than `timeout_seconds`
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout = Some(Duration::from_secs(timeout_seconds));
        self
    }

    fn build_command(spec: &CommandSpec) -> TokioCommand {
        let mut cmd = TokioCommand::new(spec.program());
        cmd.args(spec.argv());
        cmd.kill_on_drop(true);

        let (stdout, stderr) = match spec.output_mode() {
            OutputMode::Inherit => (Stdio::inherit(), Stdio::inherit()),
            OutputMode::Capture => (Stdio::piped(), Stdio::piped()),
        };
        cmd.stdout(stdout);
        cmd.stderr(stderr);

        cmd.stdin(match (spec.stdin_input(), spec.output_mode()) {
            (Some(_), _) => Stdio::piped(),
            (None, OutputMode::Inherit) => Stdio::inherit(),
            (None, OutputMode::Capture) => Stdio::null(),
        });
        cmd
    }

    async fn run_to_completion(
        spec: &CommandSpec,
        mut cmd: TokioCommand,
    ) -> Result<std::process::Output, CommandExecutorError> {
        let display = spec.to_string();
        let mut child = cmd.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CommandExecutorError::ProgramNotFound {
                    program: spec.program().to_string(),
                }
            } else {
                CommandExecutorError::SpawnFailed {
                    command: display.clone(),
                    source,
                }
            }
        })?;

        if let Some(input) = spec.stdin_input() {
            if let Some(mut handle) = child.stdin.take() {
                handle
                    .write_all(input.expose().as_bytes())
                    .await
                    .map_err(|source| CommandExecutorError::IoError {
                        command: display.clone(),
                        source,
                    })?;
                // Dropping the handle closes the pipe so the child sees EOF.
            }
        }

        child
            .wait_with_output()
            .await
            .map_err(|source| CommandExecutorError::IoError {
                command: display,
                source,
            })
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult, CommandExecutorError> {
        let start_time = Instant::now();
        tracing::debug!(command = %spec, "running");

        let cmd = Self::build_command(spec);
        let output = match self.timeout {
            Some(limit) => timeout(limit, Self::run_to_completion(spec, cmd))
                .await
                .map_err(|_| CommandExecutorError::Timeout {
                    command: spec.to_string(),
                    timeout_seconds: limit.as_secs(),
                })??,
            None => Self::run_to_completion(spec, cmd).await?,
        };

        let execution_time = start_time.elapsed().as_millis() as u64;
        let result = ExecutionResult::new(
            output.status.code(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
            execution_time,
        );
        tracing::debug!(
            command = %spec.summary(),
            exit_code = ?result.exit_code,
            elapsed_ms = execution_time,
            "finished"
        );
        Ok(result)
    }
}
