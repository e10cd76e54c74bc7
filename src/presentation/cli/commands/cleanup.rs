use std::sync::Arc;

use crate::application::services::ProgressReporter;
use crate::application::use_cases::{TeardownConfig, TeardownInfrastructureUseCase};
use crate::common::result::ProvisionResult;
use crate::domain::entities::provision_config::SecretNames;
use crate::domain::value_objects::resource_name::ResourceNames;
use crate::infrastructure::{AzureCli, GitHubCli};
use crate::presentation::cli::console::{print_field, print_success};

/// Handler for the cleanup command
pub struct CleanupCommand {
    az: AzureCli,
    gh: GitHubCli,
    config: TeardownConfig,
    progress: Arc<dyn ProgressReporter>,
}

impl CleanupCommand {
    pub fn new(
        az: AzureCli,
        gh: GitHubCli,
        names: &ResourceNames,
        secrets: SecretNames,
        purge_credentials: bool,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        let config = TeardownConfig {
            resource_group: names.resource_group.clone(),
            service_principal: names.service_principal.clone(),
            secrets,
            purge_credentials,
        };
        Self {
            az,
            gh,
            config,
            progress,
        }
    }

    pub async fn execute(&self) -> ProvisionResult<()> {
        let use_case = TeardownInfrastructureUseCase::new(
            self.az.clone(),
            self.gh.clone(),
            self.config.clone(),
            self.progress.clone(),
        );
        let outcome = use_case.execute().await?;

        print_success("Cleanup completed!");
        print_field("Deleted resource group", &self.config.resource_group);
        if self.config.purge_credentials {
            print_field(
                "Deleted service principals",
                &outcome.deleted_service_principals.len().to_string(),
            );
            print_field("Deleted secrets", &outcome.deleted_secrets.join(", "));
        }
        Ok(())
    }
}
