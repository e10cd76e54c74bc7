use std::fmt;

use crate::domain::value_objects::cli_tool::CliTool;
use crate::domain::value_objects::secret::Secret;

/// A single command-line argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandArg {
    Plain(String),
    /// Passed to the process verbatim, rendered as `***` everywhere else
    Secret(Secret),
}

impl CommandArg {
    pub fn value(&self) -> &str {
        match self {
            CommandArg::Plain(value) => value,
            CommandArg::Secret(secret) => secret.expose(),
        }
    }
}

impl fmt::Display for CommandArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandArg::Plain(value) if needs_quoting(value) => {
                write!(f, "'{}'", value.replace('\'', "'\\''"))
            }
            CommandArg::Plain(value) => write!(f, "{}", value),
            CommandArg::Secret(_) => write!(f, "{}", Secret::MASK),
        }
    }
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '$' | '[' | ']' | '*' | '&' | ';' | '|'))
}

/// How the child's stdio is wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// stdin/stdout/stderr go to the terminal (interactive logins, progress output)
    Inherit,
    /// stdout and stderr are captured and returned
    Capture,
}

/// Description of one external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<CommandArg>,
    stdin: Option<Secret>,
    output: OutputMode,
    placeholder: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            output: OutputMode::Inherit,
            placeholder: None,
        }
    }

    pub fn tool(tool: CliTool) -> Self {
        Self::new(tool.executable())
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(CommandArg::Plain(arg.into()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|a| CommandArg::Plain(a.into())));
        self
    }

    pub fn secret_arg(mut self, secret: Secret) -> Self {
        self.args.push(CommandArg::Secret(secret));
        self
    }

    /// `--flag value`
    pub fn opt(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    /// `--flag <secret>`
    pub fn secret_opt(self, flag: &str, secret: Secret) -> Self {
        self.arg(flag).secret_arg(secret)
    }

    /// Feed a secret on stdin instead of argv
    pub fn stdin(mut self, input: Secret) -> Self {
        self.stdin = Some(input);
        self
    }

    pub fn captured(mut self) -> Self {
        self.output = OutputMode::Capture;
        self
    }

    /// Output a dry run reports for this command
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Real argument values, secrets included
    pub fn argv(&self) -> Vec<&str> {
        self.args.iter().map(CommandArg::value).collect()
    }

    pub fn stdin_input(&self) -> Option<&Secret> {
        self.stdin.as_ref()
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// `program sub command`, the first non-flag words. Used in log lines.
    pub fn summary(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(
                self.args
                    .iter()
                    .take_while(|a| matches!(a, CommandArg::Plain(v) if !v.starts_with('-')))
                    .map(CommandArg::value),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if self.stdin.is_some() {
            write!(f, " <<< {}", Secret::MASK)?;
        }
        Ok(())
    }
}
