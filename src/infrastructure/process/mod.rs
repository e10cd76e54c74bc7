pub mod command_executor;
pub mod command_spec;
pub mod dry_run;
pub mod tool_locator;

pub use command_executor::{CommandExecutorError, CommandRunner, ExecutionResult, ProcessRunner};
pub use command_spec::{CommandArg, CommandSpec, OutputMode};
pub use dry_run::DryRunRunner;
pub use tool_locator::ToolLocator;

use crate::common::error::ProvisionError;
use crate::common::result::ProvisionResult;

/// Run a command and turn a non-zero exit into a `CommandError`
pub async fn run_checked(
    runner: &dyn CommandRunner,
    spec: &CommandSpec,
) -> ProvisionResult<ExecutionResult> {
    let result = runner.run(spec).await?;
    if !result.success {
        return Err(ProvisionError::command_failed(
            spec.to_string(),
            result.exit_code,
            result.stderr.clone(),
        ));
    }
    Ok(result)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Response {
        pattern: String,
        result: ExecutionResult,
    }

    /// Records every command and answers from a list of canned responses.
    ///
    /// A response applies when its pattern is a substring of the masked
    /// command line; unmatched commands succeed with empty output.
    #[derive(Default)]
    pub struct RecordingRunner {
        calls: Mutex<Vec<CommandSpec>>,
        responses: Mutex<Vec<Response>>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, pattern: &str, stdout: &str) -> Self {
            self.push(pattern, ExecutionResult::succeeded(stdout));
            self
        }

        pub fn fail(self, pattern: &str, exit_code: i32, stderr: &str) -> Self {
            self.push(
                pattern,
                ExecutionResult::new(Some(exit_code), String::new(), stderr.to_string(), 0),
            );
            self
        }

        fn push(&self, pattern: &str, result: ExecutionResult) {
            self.responses.lock().unwrap().push(Response {
                pattern: pattern.to_string(),
                result,
            });
        }

        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }

        /// Masked command lines in call order
        pub fn lines(&self) -> Vec<String> {
            self.calls().iter().map(|c| c.to_string()).collect()
        }

        pub fn summaries(&self) -> Vec<String> {
            self.calls().iter().map(|c| c.summary()).collect()
        }

        pub fn find(&self, needle: &str) -> Option<CommandSpec> {
            self.calls()
                .into_iter()
                .find(|c| c.to_string().contains(needle))
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult, CommandExecutorError> {
            self.calls.lock().unwrap().push(spec.clone());
            let line = spec.to_string();
            let responses = self.responses.lock().unwrap();
            Ok(responses
                .iter()
                .find(|r| line.contains(&r.pattern))
                .map(|r| r.result.clone())
                .unwrap_or_else(|| ExecutionResult::succeeded("")))
        }
    }
}
