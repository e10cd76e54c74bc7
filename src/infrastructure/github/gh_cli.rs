use std::sync::Arc;

use crate::common::result::ProvisionResult;
use crate::domain::value_objects::cli_tool::CliTool;
use crate::domain::value_objects::secret::Secret;
use crate::infrastructure::process::{run_checked, CommandRunner, CommandSpec};

/// GitHub CLI wrapper
#[derive(Clone)]
pub struct GitHubCli {
    runner: Arc<dyn CommandRunner>,
    repository: Option<String>,
}

impl GitHubCli {
    /// `repository` is `OWNER/REPO`; `None` lets `gh` use the repository of
    /// the working directory.
    pub fn new(runner: Arc<dyn CommandRunner>, repository: Option<String>) -> Self {
        Self { runner, repository }
    }

    fn gh(&self) -> CommandSpec {
        CommandSpec::tool(CliTool::Gh)
    }

    fn scoped(&self, spec: CommandSpec) -> CommandSpec {
        match &self.repository {
            Some(repo) => spec.opt("--repo", repo.as_str()),
            None => spec,
        }
    }

    pub async fn login(&self) -> ProvisionResult<()> {
        run_checked(self.runner.as_ref(), &self.gh().args(["auth", "login"]))
            .await
            .map(|_| ())
    }

    /// The value goes through stdin so it never appears in a process listing.
    pub async fn set_secret(&self, name: &str, value: &Secret) -> ProvisionResult<()> {
        let spec = self
            .scoped(self.gh().args(["secret", "set", name]))
            .stdin(value.clone());
        run_checked(self.runner.as_ref(), &spec).await.map(|_| ())
    }

    /// Output is captured so a failure carries `gh`'s stderr (e.g. HTTP 404).
    pub async fn delete_secret(&self, name: &str) -> ProvisionResult<()> {
        let spec = self
            .scoped(self.gh().args(["secret", "delete", name]))
            .captured();
        run_checked(self.runner.as_ref(), &spec).await.map(|_| ())
    }
}
