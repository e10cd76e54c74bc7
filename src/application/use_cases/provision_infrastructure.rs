use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::ProgressReporter;
use crate::common::error::ProvisionError;
use crate::common::result::ProvisionResult;
use crate::domain::entities::provision_config::{ContainerAppConfig, DatabaseConfig};
use crate::domain::value_objects::resource_name::ResourceNames;
use crate::domain::value_objects::secret::Secret;
use crate::infrastructure::azure::{AzureCli, ContainerAppSpec, PostgresServerSpec, DB_PASSWORD_SECRET};

/// Azure CLIの拡張機能
const REQUIRED_EXTENSIONS: [&str; 2] = ["containerapp", "rdbms-connect"];

/// 事前登録が必要なリソースプロバイダー
const REQUIRED_PROVIDERS: [&str; 2] = ["Microsoft.App", "Microsoft.OperationalInsights"];

/// インフラ構築の各ステップ（実行順）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    Prerequisites,
    ResourceGroup,
    LogAnalyticsWorkspace,
    ContainerRegistry,
    ContainerAppsEnvironment,
    PostgresServer,
    DatabaseInitialization,
    ContainerApp,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProvisionStep::Prerequisites => "Installing CLI extensions and registering providers",
            ProvisionStep::ResourceGroup => "Creating resource group",
            ProvisionStep::LogAnalyticsWorkspace => "Creating log analytics workspace",
            ProvisionStep::ContainerRegistry => "Creating container registry",
            ProvisionStep::ContainerAppsEnvironment => "Creating container apps environment",
            ProvisionStep::PostgresServer => "Creating postgres flexible server",
            ProvisionStep::DatabaseInitialization => "Initializing databases",
            ProvisionStep::ContainerApp => "Deploying container app",
        };
        write!(f, "{}", label)
    }
}

/// インフラ構築の設定
#[derive(Debug, Clone)]
pub struct ProvisionInfrastructureConfig {
    pub names: ResourceNames,
    pub location: String,
    /// `key=value`形式のタグ
    pub tags: Vec<String>,
    pub database: DatabaseConfig,
    pub admin_password: Secret,
    /// 実行するSQLファイル（解決済みパス）
    pub init_script: PathBuf,
    pub container_app: ContainerAppConfig,
    /// CLI拡張とプロバイダー登録を行うか
    pub install_prerequisites: bool,
}

/// インフラ構築の結果
#[derive(Debug, Clone, Default)]
pub struct ProvisionOutcome {
    /// 完了したステップ
    pub completed: Vec<ProvisionStep>,
    /// コンテナアプリのFQDN
    pub app_fqdn: Option<String>,
}

/// インフラ構築ユースケース
///
/// リソースを順番に作成し、最初の失敗で中断する。ロールバックは行わない。
pub struct ProvisionInfrastructureUseCase {
    az: AzureCli,
    config: ProvisionInfrastructureConfig,
    progress: Arc<dyn ProgressReporter>,
}

impl ProvisionInfrastructureUseCase {
    pub fn new(
        az: AzureCli,
        config: ProvisionInfrastructureConfig,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            az,
            config,
            progress,
        }
    }

    /// 何かを作成する前に入力を検証する
    pub async fn validate_inputs(&self) -> ProvisionResult<()> {
        let script = &self.config.init_script;
        if !tokio::fs::try_exists(script).await.unwrap_or(false) {
            return Err(ProvisionError::filesystem_error(
                format!("SQL initialization file not found: {}", script.display()),
                Some(script.clone()),
            ));
        }
        Ok(())
    }

    /// コンテナアプリに渡す環境変数
    pub fn app_environment(&self) -> Vec<(String, String)> {
        let db = &self.config.database;
        vec![
            ("POSTGRES_HOST".to_string(), self.config.names.postgres_host()),
            ("POSTGRES_PORT".to_string(), db.port.to_string()),
            ("POSTGRES_USER".to_string(), db.admin_user.clone()),
            (
                "POSTGRES_PASSWORD".to_string(),
                format!("secretref:{}", DB_PASSWORD_SECRET),
            ),
            ("POSTGRES_DB".to_string(), db.database_name.clone()),
        ]
    }

    fn begin(&self, step: ProvisionStep, outcome: &ProvisionOutcome) {
        tracing::info!(step = ?step, completed = outcome.completed.len(), "provisioning step");
        self.progress.step(&step.to_string());
    }

    pub async fn execute(&self) -> ProvisionResult<ProvisionOutcome> {
        self.validate_inputs().await?;

        let cfg = &self.config;
        let names = &cfg.names;
        let rg = names.resource_group.as_str();
        let mut outcome = ProvisionOutcome::default();

        if cfg.install_prerequisites {
            self.begin(ProvisionStep::Prerequisites, &outcome);
            for extension in REQUIRED_EXTENSIONS {
                self.az.ensure_extension(extension).await?;
            }
            for namespace in REQUIRED_PROVIDERS {
                self.az.register_provider(namespace).await?;
            }
            outcome.completed.push(ProvisionStep::Prerequisites);
        }

        self.begin(ProvisionStep::ResourceGroup, &outcome);
        self.az.create_group(rg, &cfg.location, &cfg.tags).await?;
        outcome.completed.push(ProvisionStep::ResourceGroup);

        self.begin(ProvisionStep::LogAnalyticsWorkspace, &outcome);
        self.az
            .create_log_workspace(rg, &names.log_analytics_workspace, &cfg.location, &cfg.tags)
            .await?;
        let workspace_id = self
            .az
            .log_workspace_customer_id(rg, &names.log_analytics_workspace)
            .await?;
        let workspace_key = self
            .az
            .log_workspace_shared_key(rg, &names.log_analytics_workspace)
            .await?;
        outcome.completed.push(ProvisionStep::LogAnalyticsWorkspace);

        self.begin(ProvisionStep::ContainerRegistry, &outcome);
        self.az
            .create_registry(rg, &names.container_registry, &cfg.location, &cfg.tags)
            .await?;
        self.az
            .enable_anonymous_pull(&names.container_registry)
            .await?;
        outcome.completed.push(ProvisionStep::ContainerRegistry);

        self.begin(ProvisionStep::ContainerAppsEnvironment, &outcome);
        self.az
            .create_containerapp_env(
                rg,
                &names.container_apps_environment,
                &cfg.location,
                &workspace_id,
                &workspace_key,
                &cfg.tags,
            )
            .await?;
        outcome.completed.push(ProvisionStep::ContainerAppsEnvironment);

        self.begin(ProvisionStep::PostgresServer, &outcome);
        self.az
            .create_postgres_server(&PostgresServerSpec {
                resource_group: rg,
                server: &names.postgres_server,
                location: &cfg.location,
                database: &cfg.database,
                admin_password: &cfg.admin_password,
                tags: &cfg.tags,
            })
            .await?;
        outcome.completed.push(ProvisionStep::PostgresServer);

        self.begin(ProvisionStep::DatabaseInitialization, &outcome);
        self.az
            .execute_sql_file(
                &names.postgres_server,
                &cfg.database,
                &cfg.admin_password,
                &cfg.init_script,
            )
            .await?;
        outcome.completed.push(ProvisionStep::DatabaseInitialization);

        self.begin(ProvisionStep::ContainerApp, &outcome);
        let env_vars = self.app_environment();
        self.az
            .create_containerapp(&ContainerAppSpec {
                resource_group: rg,
                name: &names.container_app,
                environment: &names.container_apps_environment,
                app: &cfg.container_app,
                env_vars: &env_vars,
                db_password: &cfg.admin_password,
                tags: &cfg.tags,
            })
            .await?;
        outcome.completed.push(ProvisionStep::ContainerApp);

        match self.az.containerapp_fqdn(rg, &names.container_app).await {
            Ok(fqdn) => {
                self.progress.detail(&format!("Container app URL: https://{fqdn}"));
                outcome.app_fqdn = Some(fqdn);
            }
            Err(e) => {
                // Internal ingress has no public FQDN; the app itself is up.
                tracing::warn!(error = %e, "could not read container app FQDN");
                self.progress.warn("Container app has no public URL");
            }
        }

        Ok(outcome)
    }
}
