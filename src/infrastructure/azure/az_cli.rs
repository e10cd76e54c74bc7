use std::path::Path;
use std::sync::Arc;

use crate::common::error::ProvisionError;
use crate::common::result::ProvisionResult;
use crate::domain::entities::credentials::{RegistryCredentials, ServicePrincipalCredentials};
use crate::domain::entities::provision_config::{ContainerAppConfig, DatabaseConfig};
use crate::domain::value_objects::cli_tool::CliTool;
use crate::domain::value_objects::secret::Secret;
use crate::infrastructure::process::{run_checked, CommandRunner, CommandSpec, ExecutionResult};

/// Secret name under which the container app receives the database password
pub const DB_PASSWORD_SECRET: &str = "db-password";

const SDK_AUTH_PLACEHOLDER: &str = r#"{"clientId": "<client-id>", "clientSecret": "<client-secret>", "subscriptionId": "<subscription-id>", "tenantId": "<tenant-id>"}"#;
const ACR_CREDENTIAL_PLACEHOLDER: &str = r#"{"username": "<registry-username>", "passwords": [{"name": "password", "value": "<registry-password>"}]}"#;

/// Parameters for `az postgres flexible-server create`
pub struct PostgresServerSpec<'a> {
    pub resource_group: &'a str,
    pub server: &'a str,
    pub location: &'a str,
    pub database: &'a DatabaseConfig,
    pub admin_password: &'a Secret,
    pub tags: &'a [String],
}

/// Parameters for `az containerapp create`
pub struct ContainerAppSpec<'a> {
    pub resource_group: &'a str,
    pub name: &'a str,
    pub environment: &'a str,
    pub app: &'a ContainerAppConfig,
    pub env_vars: &'a [(String, String)],
    pub db_password: &'a Secret,
    pub tags: &'a [String],
}

/// Azure CLI wrapper
///
/// Every method issues exactly one `az` invocation and fails on a non-zero
/// exit status.
#[derive(Clone)]
pub struct AzureCli {
    runner: Arc<dyn CommandRunner>,
}

impl AzureCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn az() -> CommandSpec {
        CommandSpec::tool(CliTool::Az)
    }

    fn with_tags(spec: CommandSpec, tags: &[String]) -> CommandSpec {
        if tags.is_empty() {
            spec
        } else {
            spec.arg("--tags").args(tags.iter().cloned())
        }
    }

    async fn exec(&self, spec: CommandSpec) -> ProvisionResult<ExecutionResult> {
        run_checked(self.runner.as_ref(), &spec).await
    }

    /// Run a `--output tsv` query and return the single trimmed value
    async fn query(&self, spec: CommandSpec) -> ProvisionResult<String> {
        let display = spec.to_string();
        let result = self.exec(spec.opt("--output", "tsv").captured()).await?;
        let value = result.stdout_trimmed();
        if value.is_empty() {
            return Err(ProvisionError::command_error(
                format!("'{}' returned no value", display),
                display,
            ));
        }
        Ok(value.to_string())
    }

    // Session

    pub async fn login(&self) -> ProvisionResult<()> {
        self.exec(Self::az().arg("login")).await.map(|_| ())
    }

    pub async fn set_subscription(&self, subscription: &str) -> ProvisionResult<()> {
        self.exec(
            Self::az()
                .args(["account", "set"])
                .opt("--subscription", subscription),
        )
        .await
        .map(|_| ())
    }

    pub async fn subscription_id(&self) -> ProvisionResult<String> {
        self.query(
            Self::az()
                .args(["account", "show"])
                .opt("--query", "id")
                .with_placeholder("<subscription-id>"),
        )
        .await
    }

    pub async fn ensure_extension(&self, extension: &str) -> ProvisionResult<()> {
        self.exec(
            Self::az()
                .args(["extension", "add"])
                .opt("--name", extension)
                .args(["--upgrade", "--yes", "--only-show-errors"]),
        )
        .await
        .map(|_| ())
    }

    pub async fn register_provider(&self, namespace: &str) -> ProvisionResult<()> {
        self.exec(
            Self::az()
                .args(["provider", "register"])
                .opt("--namespace", namespace)
                .arg("--wait"),
        )
        .await
        .map(|_| ())
    }

    // Resource group

    pub async fn create_group(
        &self,
        resource_group: &str,
        location: &str,
        tags: &[String],
    ) -> ProvisionResult<()> {
        let spec = Self::az()
            .args(["group", "create"])
            .opt("--name", resource_group)
            .opt("--location", location);
        self.exec(Self::with_tags(spec, tags).opt("--output", "none"))
            .await
            .map(|_| ())
    }

    pub async fn delete_group(&self, resource_group: &str) -> ProvisionResult<()> {
        self.exec(
            Self::az()
                .args(["group", "delete"])
                .opt("--name", resource_group)
                .arg("--yes"),
        )
        .await
        .map(|_| ())
    }

    // Log Analytics

    pub async fn create_log_workspace(
        &self,
        resource_group: &str,
        workspace: &str,
        location: &str,
        tags: &[String],
    ) -> ProvisionResult<()> {
        let spec = Self::az()
            .args(["monitor", "log-analytics", "workspace", "create"])
            .opt("--resource-group", resource_group)
            .opt("--workspace-name", workspace)
            .opt("--location", location);
        self.exec(Self::with_tags(spec, tags).opt("--output", "none"))
            .await
            .map(|_| ())
    }

    pub async fn log_workspace_customer_id(
        &self,
        resource_group: &str,
        workspace: &str,
    ) -> ProvisionResult<String> {
        self.query(
            Self::az()
                .args(["monitor", "log-analytics", "workspace", "show"])
                .opt("--resource-group", resource_group)
                .opt("--workspace-name", workspace)
                .opt("--query", "customerId")
                .with_placeholder("<log-analytics-customer-id>"),
        )
        .await
    }

    pub async fn log_workspace_shared_key(
        &self,
        resource_group: &str,
        workspace: &str,
    ) -> ProvisionResult<Secret> {
        self.query(
            Self::az()
                .args(["monitor", "log-analytics", "workspace", "get-shared-keys"])
                .opt("--resource-group", resource_group)
                .opt("--workspace-name", workspace)
                .opt("--query", "primarySharedKey")
                .with_placeholder("<log-analytics-shared-key>"),
        )
        .await
        .map(Secret::new)
    }

    // Container registry

    pub async fn create_registry(
        &self,
        resource_group: &str,
        registry: &str,
        location: &str,
        tags: &[String],
    ) -> ProvisionResult<()> {
        // Anonymous pull needs at least the Standard SKU.
        let spec = Self::az()
            .args(["acr", "create"])
            .opt("--resource-group", resource_group)
            .opt("--name", registry)
            .opt("--location", location)
            .opt("--sku", "Standard")
            .opt("--admin-enabled", "true");
        self.exec(Self::with_tags(spec, tags).opt("--output", "none"))
            .await
            .map(|_| ())
    }

    pub async fn enable_anonymous_pull(&self, registry: &str) -> ProvisionResult<()> {
        self.exec(
            Self::az()
                .args(["acr", "update"])
                .opt("--name", registry)
                .opt("--anonymous-pull-enabled", "true")
                .opt("--output", "none"),
        )
        .await
        .map(|_| ())
    }

    pub async fn registry_credentials(&self, registry: &str) -> ProvisionResult<RegistryCredentials> {
        let result = self
            .exec(
                Self::az()
                    .args(["acr", "credential", "show"])
                    .opt("--name", registry)
                    .opt("--output", "json")
                    .captured()
                    .with_placeholder(ACR_CREDENTIAL_PLACEHOLDER),
            )
            .await?;
        RegistryCredentials::parse(&result.stdout)
    }

    // Container Apps

    pub async fn create_containerapp_env(
        &self,
        resource_group: &str,
        environment: &str,
        location: &str,
        workspace_id: &str,
        workspace_key: &Secret,
        tags: &[String],
    ) -> ProvisionResult<()> {
        let spec = Self::az()
            .args(["containerapp", "env", "create"])
            .opt("--name", environment)
            .opt("--resource-group", resource_group)
            .opt("--location", location)
            .opt("--logs-workspace-id", workspace_id)
            .secret_opt("--logs-workspace-key", workspace_key.clone());
        self.exec(Self::with_tags(spec, tags).opt("--output", "none"))
            .await
            .map(|_| ())
    }

    pub async fn create_containerapp(&self, app: &ContainerAppSpec<'_>) -> ProvisionResult<()> {
        let mut spec = Self::az()
            .args(["containerapp", "create"])
            .opt("--name", app.name)
            .opt("--resource-group", app.resource_group)
            .opt("--environment", app.environment)
            .opt("--image", app.app.image.as_str())
            .opt("--target-port", app.app.target_port.to_string())
            .opt("--ingress", app.app.ingress.to_string())
            .opt("--min-replicas", app.app.min_replicas.to_string())
            .opt("--max-replicas", app.app.max_replicas.to_string())
            .secret_opt(
                "--secrets",
                Secret::new(format!(
                    "{}={}",
                    DB_PASSWORD_SECRET,
                    app.db_password.expose()
                )),
            );

        if !app.env_vars.is_empty() {
            spec = spec
                .arg("--env-vars")
                .args(app.env_vars.iter().map(|(k, v)| format!("{k}={v}")));
        }

        self.exec(Self::with_tags(spec, app.tags).opt("--output", "none"))
            .await
            .map(|_| ())
    }

    pub async fn containerapp_fqdn(&self, resource_group: &str, name: &str) -> ProvisionResult<String> {
        self.query(
            Self::az()
                .args(["containerapp", "show"])
                .opt("--name", name)
                .opt("--resource-group", resource_group)
                .opt("--query", "properties.configuration.ingress.fqdn")
                .with_placeholder("<app-fqdn>"),
        )
        .await
    }

    // PostgreSQL

    pub async fn create_postgres_server(&self, server: &PostgresServerSpec<'_>) -> ProvisionResult<()> {
        let db = server.database;
        let spec = Self::az()
            .args(["postgres", "flexible-server", "create"])
            .opt("--resource-group", server.resource_group)
            .opt("--name", server.server)
            .opt("--location", server.location)
            .opt("--admin-user", db.admin_user.as_str())
            .secret_opt("--admin-password", server.admin_password.clone())
            .opt("--sku-name", db.sku_name.as_str())
            .opt("--tier", db.tier.as_str())
            .opt("--version", db.version.as_str())
            .opt("--storage-size", db.storage_size_gb.to_string())
            .opt("--public-access", db.public_access.as_str());
        self.exec(
            Self::with_tags(spec, server.tags)
                .arg("--yes")
                .opt("--output", "none"),
        )
        .await
        .map(|_| ())
    }

    pub async fn execute_sql_file(
        &self,
        server: &str,
        database: &DatabaseConfig,
        admin_password: &Secret,
        file: &Path,
    ) -> ProvisionResult<()> {
        self.exec(
            Self::az()
                .args(["postgres", "flexible-server", "execute"])
                .opt("--name", server)
                .opt("--admin-user", database.admin_user.as_str())
                .secret_opt("--admin-password", admin_password.clone())
                .opt("--database-name", database.database_name.as_str())
                .opt("--file-path", file.display().to_string()),
        )
        .await
        .map(|_| ())
    }

    // Service principal

    pub async fn create_service_principal(
        &self,
        name: &str,
        scope: &str,
    ) -> ProvisionResult<ServicePrincipalCredentials> {
        let result = self
            .exec(
                Self::az()
                    .args(["ad", "sp", "create-for-rbac"])
                    .opt("--name", name)
                    .opt("--role", "contributor")
                    .opt("--scopes", scope)
                    .arg("--sdk-auth")
                    .opt("--output", "json")
                    .captured()
                    .with_placeholder(SDK_AUTH_PLACEHOLDER),
            )
            .await?;
        ServicePrincipalCredentials::parse(&result.stdout)
    }

    /// App ids of every service principal with this display name
    pub async fn service_principal_ids(&self, name: &str) -> ProvisionResult<Vec<String>> {
        let result = self
            .exec(
                Self::az()
                    .args(["ad", "sp", "list"])
                    .opt("--display-name", name)
                    .opt("--query", "[].appId")
                    .opt("--output", "tsv")
                    .captured()
                    .with_placeholder("<service-principal-app-id>"),
            )
            .await?;
        Ok(result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub async fn delete_service_principal(&self, app_id: &str) -> ProvisionResult<()> {
        self.exec(Self::az().args(["ad", "sp", "delete"]).opt("--id", app_id))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::process::testing::RecordingRunner;
    use pretty_assertions::assert_eq;

    fn cli(runner: &Arc<RecordingRunner>) -> AzureCli {
        AzureCli::new(runner.clone())
    }

    #[tokio::test]
    async fn test_create_group_args() {
        let runner = Arc::new(RecordingRunner::new());
        cli(&runner)
            .create_group("rg-demo-alice", "westeurope", &["managed-by=azprov".to_string()])
            .await
            .unwrap();

        assert_eq!(
            runner.calls()[0].argv(),
            vec![
                "group",
                "create",
                "--name",
                "rg-demo-alice",
                "--location",
                "westeurope",
                "--tags",
                "managed-by=azprov",
                "--output",
                "none"
            ]
        );
    }

    #[tokio::test]
    async fn test_query_trims_tsv_output() {
        let runner = Arc::new(RecordingRunner::new().respond("customerId", "abc-123\n"));
        let id = cli(&runner)
            .log_workspace_customer_id("rg", "log")
            .await
            .unwrap();

        assert_eq!(id, "abc-123");
        assert!(runner.lines()[0].ends_with("--query customerId --output tsv"));
    }

    #[tokio::test]
    async fn test_query_rejects_empty_output() {
        let runner = Arc::new(RecordingRunner::new().respond("account show", "  \n"));
        let error = cli(&runner).subscription_id().await.unwrap_err();
        assert!(error.to_string().contains("returned no value"));
    }

    #[tokio::test]
    async fn test_containerapp_env_masks_workspace_key() {
        let runner = Arc::new(RecordingRunner::new());
        cli(&runner)
            .create_containerapp_env("rg", "cae", "westeurope", "id-1", &Secret::new("k3y"), &[])
            .await
            .unwrap();

        let line = &runner.lines()[0];
        assert!(line.contains("--logs-workspace-id id-1 --logs-workspace-key ***"));
        assert!(!line.contains("k3y"));
        assert!(runner.calls()[0].argv().contains(&"k3y"));
    }

    #[tokio::test]
    async fn test_service_principal_ids_splits_lines() {
        let runner = Arc::new(RecordingRunner::new().respond("ad sp list", "id-1\n\nid-2\n"));
        let ids = cli(&runner).service_principal_ids("sp-demo-alice").await.unwrap();
        assert_eq!(ids, vec!["id-1".to_string(), "id-2".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_group_failure_is_reported() {
        let runner = Arc::new(RecordingRunner::new().fail("group delete", 3, "ResourceGroupNotFound"));
        let error = cli(&runner).delete_group("rg-demo-alice").await.unwrap_err();
        assert!(matches!(
            error,
            ProvisionError::CommandError {
                exit_code: Some(3),
                ..
            }
        ));
    }
}
