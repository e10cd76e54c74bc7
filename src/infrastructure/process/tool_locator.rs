use std::ffi::OsString;
use std::path::PathBuf;

use crate::common::error::ProvisionError;
use crate::common::result::ProvisionResult;
use crate::domain::value_objects::cli_tool::CliTool;

/// Resolves tools on a search path
#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    search_path: Option<OsString>,
}

impl ToolLocator {
    /// Search the process `PATH`
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Search an explicit `PATH`-style list instead of the environment
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    pub fn locate(&self, tool: CliTool) -> ProvisionResult<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir()?;
                which::which_in(tool.executable(), Some(paths), cwd)
            }
            None => which::which(tool.executable()),
        };

        found.map_err(|_| ProvisionError::missing_dependency(tool.executable(), tool.install_hint()))
    }

    pub fn is_available(&self, tool: CliTool) -> bool {
        self.locate(tool).is_ok()
    }
}
