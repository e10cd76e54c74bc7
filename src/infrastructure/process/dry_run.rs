use async_trait::async_trait;
use colored::Colorize;
use std::sync::Mutex;

use super::command_executor::{CommandExecutorError, CommandRunner, ExecutionResult};
use super::command_spec::CommandSpec;

/// Prints commands instead of running them.
///
/// Captured commands answer with their placeholder so the calling workflow
/// can continue end to end.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    transcript: Mutex<Vec<String>>,
    quiet: bool,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record without printing
    pub fn quiet() -> Self {
        Self {
            transcript: Mutex::new(Vec::new()),
            quiet: true,
        }
    }

    /// Every command seen so far, rendered with secrets masked
    pub fn transcript(&self) -> Vec<String> {
        self.transcript
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CommandRunner for DryRunRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult, CommandExecutorError> {
        let line = spec.to_string();
        if !self.quiet {
            println!("  {} {}", "$".dimmed(), line);
        }
        if let Ok(mut transcript) = self.transcript.lock() {
            transcript.push(line);
        }
        Ok(ExecutionResult::succeeded(
            spec.placeholder().unwrap_or_default(),
        ))
    }
}
