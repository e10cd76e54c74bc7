use std::sync::Arc;

use crate::application::services::ProgressReporter;
use crate::common::result::ProvisionResult;
use crate::domain::entities::provision_config::SecretNames;
use crate::domain::value_objects::resource_name::ResourceNames;
use crate::domain::value_objects::secret::Secret;
use crate::infrastructure::{AzureCli, GitHubCli};

/// リポジトリ設定の結果
#[derive(Debug, Clone, Default)]
pub struct RepositoryOutcome {
    /// 作成したサービスプリンシパルのクライアントID
    pub service_principal_client_id: String,
    /// 登録したシークレット名
    pub secrets_set: Vec<String>,
}

/// GitHubリポジトリへのCIシークレット登録
///
/// リソースグループに権限を絞ったサービスプリンシパルを作成し、
/// その認証情報とレジストリの管理者資格情報をシークレットとして登録する。
pub struct ConfigureRepositoryUseCase {
    az: AzureCli,
    gh: GitHubCli,
    names: ResourceNames,
    secrets: SecretNames,
    progress: Arc<dyn ProgressReporter>,
}

impl ConfigureRepositoryUseCase {
    pub fn new(
        az: AzureCli,
        gh: GitHubCli,
        names: ResourceNames,
        secrets: SecretNames,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            az,
            gh,
            names,
            secrets,
            progress,
        }
    }

    /// サービスプリンシパルのスコープ
    pub fn scope(subscription_id: &str, resource_group: &str) -> String {
        format!("/subscriptions/{subscription_id}/resourceGroups/{resource_group}")
    }

    pub async fn execute(&self) -> ProvisionResult<RepositoryOutcome> {
        self.progress.step("Creating service principal for CI");
        let subscription_id = self.az.subscription_id().await?;
        let scope = Self::scope(&subscription_id, &self.names.resource_group);
        let credentials = self
            .az
            .create_service_principal(&self.names.service_principal, &scope)
            .await?;
        tracing::info!(client_id = %credentials.client_id, scope = %scope, "service principal ready");

        self.progress.step("Reading container registry credentials");
        let registry = self
            .az
            .registry_credentials(&self.names.container_registry)
            .await?;
        let registry_password = registry.primary_password()?.clone();

        self.progress.step("Storing CI secrets in GitHub");
        let values: [(&str, Secret); 3] = [
            (
                self.secrets.azure_credentials.as_str(),
                credentials.document().clone(),
            ),
            (
                self.secrets.registry_username.as_str(),
                Secret::new(registry.username.clone()),
            ),
            (self.secrets.registry_password.as_str(), registry_password),
        ];

        let mut outcome = RepositoryOutcome {
            service_principal_client_id: credentials.client_id.clone(),
            secrets_set: Vec::with_capacity(values.len()),
        };
        for (name, value) in &values {
            self.gh.set_secret(name, value).await?;
            self.progress.detail(&format!("Set secret {name}"));
            outcome.secrets_set.push(name.to_string());
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::SilentProgress;
    use crate::common::error::ProvisionError;
    use crate::domain::value_objects::resource_name::UserSlug;
    use crate::infrastructure::process::testing::RecordingRunner;
    use pretty_assertions::assert_eq;

    const SDK_AUTH: &str = r#"{"clientId": "cid", "clientSecret": "csecret", "subscriptionId": "sub-1", "tenantId": "tid"}"#;
    const ACR_CREDENTIALS: &str =
        r#"{"username": "acrdemoalice", "passwords": [{"name": "password", "value": "acr-pw"}]}"#;

    fn use_case(runner: &Arc<RecordingRunner>) -> ConfigureRepositoryUseCase {
        ConfigureRepositoryUseCase::new(
            AzureCli::new(runner.clone()),
            GitHubCli::new(runner.clone(), Some("acme/shop".to_string())),
            ResourceNames::derive("demo", &UserSlug::new("alice").unwrap()),
            SecretNames::default(),
            Arc::new(SilentProgress),
        )
    }

    fn scripted_runner() -> Arc<RecordingRunner> {
        Arc::new(
            RecordingRunner::new()
                .respond("account show", "sub-1\n")
                .respond("create-for-rbac", SDK_AUTH)
                .respond("acr credential show", ACR_CREDENTIALS),
        )
    }

    #[tokio::test]
    async fn test_service_principal_scoped_to_group() {
        let runner = scripted_runner();
        let outcome = use_case(&runner).execute().await.unwrap();

        let create = runner.find("create-for-rbac").unwrap().to_string();
        assert!(create.contains("--name sp-demo-alice"));
        assert!(create.contains("--scopes /subscriptions/sub-1/resourceGroups/rg-demo-alice"));
        assert!(create.contains("--sdk-auth"));
        assert_eq!(outcome.service_principal_client_id, "cid");
    }

    #[tokio::test]
    async fn test_secrets_are_piped_to_gh() {
        let runner = scripted_runner();
        let outcome = use_case(&runner).execute().await.unwrap();

        assert_eq!(
            outcome.secrets_set,
            vec!["AZURE_CREDENTIALS", "REGISTRY_USERNAME", "REGISTRY_PASSWORD"]
        );

        let stdin_of = |name: &str| {
            runner
                .find(&format!("secret set {name}"))
                .and_then(|spec| spec.stdin_input().map(|s| s.expose().to_string()))
        };
        assert_eq!(stdin_of("AZURE_CREDENTIALS").as_deref(), Some(SDK_AUTH));
        assert_eq!(stdin_of("REGISTRY_USERNAME").as_deref(), Some("acrdemoalice"));
        assert_eq!(stdin_of("REGISTRY_PASSWORD").as_deref(), Some("acr-pw"));

        for line in runner.lines() {
            assert!(!line.contains("acr-pw"), "secret leaked in {line}");
            assert!(!line.contains("csecret"), "secret leaked in {line}");
        }
    }

    #[tokio::test]
    async fn test_invalid_credentials_stop_before_github() {
        let runner = Arc::new(
            RecordingRunner::new()
                .respond("account show", "sub-1\n")
                .respond("create-for-rbac", r#"{"clientId": "cid"}"#),
        );
        let error = use_case(&runner).execute().await.unwrap_err();

        assert!(matches!(error, ProvisionError::ValidationError { .. }));
        assert!(runner.find("gh ").is_none());
    }

    #[test]
    fn test_scope_format() {
        assert_eq!(
            ConfigureRepositoryUseCase::scope("abc", "rg-x"),
            "/subscriptions/abc/resourceGroups/rg-x"
        );
    }
}
