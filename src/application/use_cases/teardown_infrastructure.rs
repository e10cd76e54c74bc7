use std::sync::Arc;

use crate::application::services::ProgressReporter;
use crate::common::error::ProvisionError;
use crate::common::result::ProvisionResult;
use crate::domain::entities::provision_config::SecretNames;
use crate::infrastructure::{AzureCli, GitHubCli};

/// 後片付けの設定
#[derive(Debug, Clone)]
pub struct TeardownConfig {
    pub resource_group: String,
    pub service_principal: String,
    pub secrets: SecretNames,
    /// サービスプリンシパルとCIシークレットも削除するか
    pub purge_credentials: bool,
}

/// 後片付けの結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownOutcome {
    pub deleted_secrets: Vec<String>,
    pub deleted_service_principals: Vec<String>,
    pub resource_group_deleted: bool,
}

/// 後片付けユースケース
///
/// 既定ではリソースグループのみ削除する。`purge_credentials`を指定すると、
/// setupが作成したCIシークレットとサービスプリンシパルも削除する。
pub struct TeardownInfrastructureUseCase {
    az: AzureCli,
    gh: GitHubCli,
    config: TeardownConfig,
    progress: Arc<dyn ProgressReporter>,
}

impl TeardownInfrastructureUseCase {
    pub fn new(
        az: AzureCli,
        gh: GitHubCli,
        config: TeardownConfig,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            az,
            gh,
            config,
            progress,
        }
    }

    pub async fn execute(&self) -> ProvisionResult<TeardownOutcome> {
        let mut outcome = TeardownOutcome::default();

        if self.config.purge_credentials {
            self.revoke_secrets(&mut outcome).await?;
            self.delete_service_principals(&mut outcome).await?;
        }

        self.progress.step(&format!(
            "Deleting resource group {}",
            self.config.resource_group
        ));
        self.az.delete_group(&self.config.resource_group).await?;
        outcome.resource_group_deleted = true;
        tracing::info!(resource_group = %self.config.resource_group, "resource group deleted");

        Ok(outcome)
    }

    async fn revoke_secrets(&self, outcome: &mut TeardownOutcome) -> ProvisionResult<()> {
        self.progress.step("Revoking CI secrets");
        for name in self.config.secrets.all() {
            match self.gh.delete_secret(name).await {
                Ok(()) => {
                    self.progress.detail(&format!("Deleted secret {name}"));
                    outcome.deleted_secrets.push(name.to_string());
                }
                Err(e) if is_not_found(&e) => {
                    self.progress
                        .warn(&format!("Secret {name} does not exist, skipping"));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn delete_service_principals(&self, outcome: &mut TeardownOutcome) -> ProvisionResult<()> {
        self.progress.step(&format!(
            "Deleting service principal {}",
            self.config.service_principal
        ));
        let app_ids = self
            .az
            .service_principal_ids(&self.config.service_principal)
            .await?;
        if app_ids.is_empty() {
            self.progress.warn(&format!(
                "No service principal named {} found",
                self.config.service_principal
            ));
        }
        for app_id in app_ids {
            self.az.delete_service_principal(&app_id).await?;
            outcome.deleted_service_principals.push(app_id);
        }
        Ok(())
    }
}

/// `gh secret delete`が対象なしで失敗したか
fn is_not_found(error: &ProvisionError) -> bool {
    match error {
        ProvisionError::CommandError {
            stderr: Some(stderr),
            ..
        } => stderr.contains("404") || stderr.to_lowercase().contains("not found"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{RecordedProgress, SilentProgress};
    use crate::infrastructure::process::testing::RecordingRunner;
    use pretty_assertions::assert_eq;

    fn use_case(runner: &Arc<RecordingRunner>, purge_credentials: bool) -> TeardownInfrastructureUseCase {
        TeardownInfrastructureUseCase::new(
            AzureCli::new(runner.clone()),
            GitHubCli::new(runner.clone(), None),
            TeardownConfig {
                resource_group: "rg-demo-alice".to_string(),
                service_principal: "sp-demo-alice".to_string(),
                secrets: SecretNames::default(),
                purge_credentials,
            },
            Arc::new(SilentProgress),
        )
    }

    #[tokio::test]
    async fn test_default_cleanup_only_deletes_group() {
        let runner = Arc::new(RecordingRunner::new());
        let outcome = use_case(&runner, false).execute().await.unwrap();

        assert_eq!(runner.lines(), vec!["az group delete --name rg-demo-alice --yes"]);
        assert_eq!(
            outcome,
            TeardownOutcome {
                deleted_secrets: vec![],
                deleted_service_principals: vec![],
                resource_group_deleted: true,
            }
        );
    }

    #[tokio::test]
    async fn test_purge_removes_credentials_before_group() {
        let runner = Arc::new(RecordingRunner::new().respond("ad sp list", "app-1\napp-2\n"));
        let outcome = use_case(&runner, true).execute().await.unwrap();

        assert_eq!(
            runner.lines(),
            vec![
                "gh secret delete AZURE_CREDENTIALS",
                "gh secret delete REGISTRY_USERNAME",
                "gh secret delete REGISTRY_PASSWORD",
                "az ad sp list --display-name sp-demo-alice --query '[].appId' --output tsv",
                "az ad sp delete --id app-1",
                "az ad sp delete --id app-2",
                "az group delete --name rg-demo-alice --yes",
            ]
        );
        assert_eq!(outcome.deleted_secrets.len(), 3);
        assert_eq!(outcome.deleted_service_principals, vec!["app-1", "app-2"]);
    }

    #[tokio::test]
    async fn test_purge_tolerates_missing_secret() {
        let runner = Arc::new(RecordingRunner::new().fail(
            "secret delete REGISTRY_USERNAME",
            1,
            "HTTP 404: Not Found (https://api.github.com/repos/acme/shop/actions/secrets/REGISTRY_USERNAME)",
        ));
        let outcome = use_case(&runner, true).execute().await.unwrap();

        assert_eq!(
            outcome.deleted_secrets,
            vec!["AZURE_CREDENTIALS", "REGISTRY_PASSWORD"]
        );
        assert!(outcome.resource_group_deleted);
    }

    #[tokio::test]
    async fn test_missing_service_principal_is_reported() {
        let runner = Arc::new(RecordingRunner::new().respond("ad sp list", ""));
        let progress = Arc::new(RecordedProgress::new());
        let use_case = TeardownInfrastructureUseCase::new(
            AzureCli::new(runner.clone()),
            GitHubCli::new(runner.clone(), None),
            TeardownConfig {
                resource_group: "rg-demo-alice".to_string(),
                service_principal: "sp-demo-alice".to_string(),
                secrets: SecretNames::default(),
                purge_credentials: true,
            },
            progress.clone(),
        );

        let outcome = use_case.execute().await.unwrap();

        assert!(outcome.deleted_service_principals.is_empty());
        assert!(progress
            .events()
            .contains(&"warn: No service principal named sp-demo-alice found".to_string()));
        assert!(runner.find("ad sp delete").is_none());
    }

    #[tokio::test]
    async fn test_purge_aborts_on_other_gh_errors() {
        let runner = Arc::new(RecordingRunner::new().fail(
            "secret delete AZURE_CREDENTIALS",
            1,
            "HTTP 403: Resource not accessible by integration",
        ));
        assert!(use_case(&runner, true).execute().await.is_err());
        assert!(runner.find("group delete").is_none());
    }

    #[tokio::test]
    async fn test_group_delete_failure_propagates() {
        let runner = Arc::new(RecordingRunner::new().fail("group delete", 3, "ResourceGroupNotFound"));
        let error = use_case(&runner, false).execute().await.unwrap_err();
        assert!(error.to_string().contains("ResourceGroupNotFound"));
    }
}
