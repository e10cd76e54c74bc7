use std::sync::Arc;

use crate::common::error::ProvisionError;
use crate::common::result::ProvisionResult;
use crate::domain::value_objects::cli_tool::CliTool;
use crate::domain::value_objects::resource_name::UserSlug;
use crate::infrastructure::process::{run_checked, CommandRunner, CommandSpec};

/// Local user identity used to make resource names unique
pub struct SystemIdentity {
    runner: Arc<dyn CommandRunner>,
}

impl SystemIdentity {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// `configured` wins; otherwise ask `whoami`
    pub async fn resolve(&self, configured: Option<&str>) -> ProvisionResult<UserSlug> {
        let raw = match configured {
            Some(user) => user.to_string(),
            None => {
                let spec = CommandSpec::tool(CliTool::Whoami).captured();
                run_checked(self.runner.as_ref(), &spec)
                    .await?
                    .stdout_trimmed()
                    .to_string()
            }
        };

        let slug = UserSlug::new(&raw).map_err(|e| {
            ProvisionError::validation_error("user", e.to_string(), Some(raw.clone()))
        })?;
        tracing::debug!(user = %slug, "resolved user identity");
        Ok(slug)
    }
}
