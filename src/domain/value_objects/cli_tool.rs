use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// External command-line tools driven by azprov
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliTool {
    /// Azure CLI
    Az,
    /// GitHub CLI
    Gh,
    /// Local identity lookup
    Whoami,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliToolError {
    #[error("Unsupported tool: {0}")]
    UnsupportedTool(String),
}

impl CliTool {
    /// Tools that must be present before any login or resource action
    pub const REQUIRED: [CliTool; 2] = [CliTool::Az, CliTool::Gh];

    /// Executable name looked up on PATH
    pub fn executable(&self) -> &'static str {
        match self {
            CliTool::Az => "az",
            CliTool::Gh => "gh",
            CliTool::Whoami => "whoami",
        }
    }

    /// Whether the pre-flight check insists on this tool
    pub fn is_required(&self) -> bool {
        match self {
            CliTool::Az | CliTool::Gh => true,
            CliTool::Whoami => false, // part of every base system
        }
    }

    /// Human readable installation hint
    pub fn install_hint(&self) -> &'static str {
        match self {
            CliTool::Az => {
                "Install the Azure CLI: https://learn.microsoft.com/cli/azure/install-azure-cli"
            }
            CliTool::Gh => "Install the GitHub CLI: https://cli.github.com/",
            CliTool::Whoami => "Install coreutils or set AZPROV_USER.",
        }
    }
}

impl fmt::Display for CliTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.executable())
    }
}

impl FromStr for CliTool {
    type Err = CliToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "az" | "azure" | "azure-cli" => Ok(CliTool::Az),
            "gh" | "github" | "github-cli" => Ok(CliTool::Gh),
            "whoami" => Ok(CliTool::Whoami),
            _ => Err(CliToolError::UnsupportedTool(s.to_string())),
        }
    }
}
