use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::ProgressReporter;
use crate::application::use_cases::{
    ConfigureRepositoryUseCase, ProvisionInfrastructureConfig, ProvisionInfrastructureUseCase,
};
use crate::common::result::ProvisionResult;
use crate::domain::entities::provision_config::ProvisionConfig;
use crate::domain::value_objects::resource_name::ResourceNames;
use crate::infrastructure::{AzureCli, ConfigStore, GitHubCli};
use crate::presentation::cli::console::{print_field, print_success};

/// Handler for the setup command
pub struct SetupCommand {
    az: AzureCli,
    gh: GitHubCli,
    config: ProvisionConfig,
    config_path: Option<PathBuf>,
    names: ResourceNames,
    progress: Arc<dyn ProgressReporter>,
}

impl SetupCommand {
    pub fn new(
        az: AzureCli,
        gh: GitHubCli,
        config: ProvisionConfig,
        config_path: Option<PathBuf>,
        names: ResourceNames,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            az,
            gh,
            config,
            config_path,
            names,
            progress,
        }
    }

    /// Settings for the provisioning use case
    pub fn provision_config(&self) -> ProvisionResult<ProvisionInfrastructureConfig> {
        let admin_password = self.config.require_database_password()?.clone();
        let init_script = ConfigStore::resolve_relative(
            self.config_path.as_deref(),
            &self.config.database.init_script,
        );

        Ok(ProvisionInfrastructureConfig {
            names: self.names.clone(),
            location: self.config.location.clone(),
            tags: self.config.tag_pairs(chrono::Utc::now()),
            database: self.config.database.clone(),
            admin_password,
            init_script,
            container_app: self.config.container_app.clone(),
            install_prerequisites: self.config.install_prerequisites,
        })
    }

    pub async fn execute(&self) -> ProvisionResult<()> {
        let provision = ProvisionInfrastructureUseCase::new(
            self.az.clone(),
            self.provision_config()?,
            self.progress.clone(),
        );
        let infrastructure = provision.execute().await?;

        let repository = ConfigureRepositoryUseCase::new(
            self.az.clone(),
            self.gh.clone(),
            self.names.clone(),
            self.config.github.secrets.clone(),
            self.progress.clone(),
        );
        let repository = repository.execute().await?;

        print_success("Setup completed!");
        print_field("Resource group", &self.names.resource_group);
        print_field("Container registry", &self.names.container_registry);
        print_field("PostgreSQL server", &self.names.postgres_host());
        if let Some(fqdn) = &infrastructure.app_fqdn {
            print_field("Container app", &format!("https://{fqdn}"));
        }
        print_field("Service principal", &repository.service_principal_client_id);
        print_field("Secrets", &repository.secrets_set.join(", "));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::SilentProgress;
    use crate::domain::value_objects::resource_name::UserSlug;
    use crate::domain::value_objects::secret::Secret;
    use crate::infrastructure::process::testing::RecordingRunner;
    use std::path::Path;

    fn command(config: ProvisionConfig, config_path: Option<&Path>) -> SetupCommand {
        let runner = Arc::new(RecordingRunner::new());
        let names = config
            .resolve_names(&UserSlug::new("alice").unwrap())
            .unwrap();
        SetupCommand::new(
            AzureCli::new(runner.clone()),
            GitHubCli::new(runner, None),
            config,
            config_path.map(Path::to_path_buf),
            names,
            Arc::new(SilentProgress),
        )
    }

    #[test]
    fn test_provision_config_requires_password() {
        let error = command(ProvisionConfig::default(), None)
            .provision_config()
            .unwrap_err();
        assert!(error.to_string().contains("AZPROV_DB_PASSWORD"));
    }

    #[test]
    fn test_init_script_resolved_next_to_config_file() {
        let mut config = ProvisionConfig::default();
        config.database.admin_password = Some(Secret::new("Sup3r-secret"));

        let settings = command(config, Some(Path::new("/srv/app/azprov.yaml")))
            .provision_config()
            .unwrap();

        assert_eq!(
            settings.init_script,
            Path::new("/srv/app/infrastructure/db-init/initialize-databases.sql")
        );
        assert_eq!(settings.names.resource_group, "rg-demo-alice");
        assert!(settings.install_prerequisites);
        assert!(settings.tags.iter().any(|t| t.starts_with("provisioned-at=")));
    }

    #[test]
    fn test_prerequisites_step_follows_config() {
        let mut config = ProvisionConfig::default();
        config.database.admin_password = Some(Secret::new("Sup3r-secret"));
        config.install_prerequisites = false;

        let settings = command(config, None).provision_config().unwrap();
        assert!(!settings.install_prerequisites);
    }
}
