use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use validator::{Validate, ValidationError};

use crate::common::error::ProvisionError;
use crate::common::result::{OptionExt, ProvisionResult};
use crate::domain::value_objects::resource_name::{
    validate_prefix, NameOverrides, ResourceNames, UserSlug,
};
use crate::domain::value_objects::secret::Secret;

/// SQL初期化ファイルの既定パス（リポジトリルートからの相対）
pub const DEFAULT_INIT_SCRIPT: &str = "infrastructure/db-init/initialize-databases.sql";

/// 1回の実行に必要な設定一式
///
/// 既定値 → 設定ファイル → 環境変数/CLIの順に上書きされる。
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ProvisionConfig {
    /// リソース名のプレフィックス
    #[validate(custom(function = "validate_prefix_field"))]
    pub prefix: String,

    /// Azureリージョン
    #[validate(length(min = 1, max = 64))]
    pub location: String,

    /// `whoami`の代わりに使うユーザー名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// ログイン後に選択するサブスクリプション
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,

    /// 外部コマンド1回あたりのタイムアウト（未設定なら無制限）
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub command_timeout_secs: Option<u64>,

    /// setup前にCLI拡張機能の追加とリソースプロバイダーの登録を行うか
    pub install_prerequisites: bool,

    /// 全リソースに付与するタグ
    pub tags: BTreeMap<String, String>,

    /// リソース名の個別上書き
    pub names: NameOverrides,

    #[validate(nested)]
    pub database: DatabaseConfig,

    #[validate(nested)]
    pub container_app: ContainerAppConfig,

    #[validate(nested)]
    pub github: GitHubConfig,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("managed-by".to_string(), "azprov".to_string());

        Self {
            prefix: "demo".to_string(),
            location: "westeurope".to_string(),
            user: None,
            subscription: None,
            command_timeout_secs: None,
            install_prerequisites: true,
            tags,
            names: NameOverrides::default(),
            database: DatabaseConfig::default(),
            container_app: ContainerAppConfig::default(),
            github: GitHubConfig::default(),
        }
    }
}

/// PostgreSQLフレキシブルサーバーの設定
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    #[validate(custom(function = "validate_admin_user"))]
    pub admin_user: String,

    /// 管理者パスワード（既定値なし、setup時に必須）
    #[serde(skip_serializing)]
    pub admin_password: Option<Secret>,

    #[validate(length(min = 1, max = 63))]
    pub database_name: String,

    #[validate(length(min = 1))]
    pub sku_name: String,

    #[validate(length(min = 1))]
    pub tier: String,

    #[validate(length(min = 1))]
    pub version: String,

    #[validate(range(min = 32, max = 16384))]
    pub storage_size_gb: u32,

    #[validate(range(min = 1))]
    pub port: u16,

    /// `--public-access`に渡す値（0.0.0.0はAzure内部からのアクセスのみ許可）
    #[validate(length(min = 1))]
    pub public_access: String,

    /// 作成直後に実行するSQLファイル
    pub init_script: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            admin_user: "pgadmin".to_string(),
            admin_password: None,
            database_name: "postgres".to_string(),
            sku_name: "Standard_B1ms".to_string(),
            tier: "Burstable".to_string(),
            version: "16".to_string(),
            storage_size_gb: 32,
            port: 5432,
            public_access: "0.0.0.0".to_string(),
            init_script: PathBuf::from(DEFAULT_INIT_SCRIPT),
        }
    }
}

/// Ingressの公開範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ingress {
    External,
    Internal,
}

impl fmt::Display for Ingress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ingress::External => write!(f, "external"),
            Ingress::Internal => write!(f, "internal"),
        }
    }
}

/// プレースホルダーとしてデプロイするコンテナアプリの設定
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerAppConfig {
    #[validate(length(min = 1))]
    pub image: String,

    #[validate(range(min = 1))]
    pub target_port: u16,

    pub ingress: Ingress,

    #[validate(range(max = 30))]
    pub min_replicas: u32,

    #[validate(range(min = 1, max = 30))]
    pub max_replicas: u32,
}

impl Default for ContainerAppConfig {
    fn default() -> Self {
        Self {
            image: "mcr.microsoft.com/k8se/quickstart:latest".to_string(),
            target_port: 80,
            ingress: Ingress::External,
            min_replicas: 0,
            max_replicas: 1,
        }
    }
}

/// CIシークレットの名前
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct SecretNames {
    #[validate(custom(function = "validate_secret_name"))]
    pub azure_credentials: String,

    #[validate(custom(function = "validate_secret_name"))]
    pub registry_username: String,

    #[validate(custom(function = "validate_secret_name"))]
    pub registry_password: String,
}

impl Default for SecretNames {
    fn default() -> Self {
        Self {
            azure_credentials: "AZURE_CREDENTIALS".to_string(),
            registry_username: "REGISTRY_USERNAME".to_string(),
            registry_password: "REGISTRY_PASSWORD".to_string(),
        }
    }
}

impl SecretNames {
    pub fn all(&self) -> [&str; 3] {
        [
            &self.azure_credentials,
            &self.registry_username,
            &self.registry_password,
        ]
    }
}

/// GitHub側の設定
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    /// `OWNER/REPO`。未設定ならカレントディレクトリのリポジトリ
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_repository"))]
    pub repository: Option<String>,

    #[validate(nested)]
    pub secrets: SecretNames,
}

/// 環境変数・CLIから渡される上書き値
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub user: Option<String>,
    pub location: Option<String>,
    pub subscription: Option<String>,
    pub db_password: Option<Secret>,
    pub github_repository: Option<String>,
}

impl ProvisionConfig {
    /// 上書き値を適用する
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(user) = overrides.user {
            self.user = Some(user);
        }
        if let Some(location) = overrides.location {
            self.location = location;
        }
        if let Some(subscription) = overrides.subscription {
            self.subscription = Some(subscription);
        }
        if let Some(password) = overrides.db_password {
            self.database.admin_password = Some(password);
        }
        if let Some(repository) = overrides.github_repository {
            self.github.repository = Some(repository);
        }
    }

    /// 設定全体を検証する
    pub fn check(&self) -> ProvisionResult<()> {
        self.validate()?;
        Ok(())
    }

    /// setupに必要な管理者パスワードを取得し、強度を検証する
    ///
    /// cleanupはパスワードを使わないため、`check()`では検証しない。
    pub fn require_database_password(&self) -> ProvisionResult<&Secret> {
        let password = self.database.admin_password.as_ref().ok_or_config_error(
            "database admin password is required for setup; set AZPROV_DB_PASSWORD or database.admin_password",
        )?;
        validate_admin_password(password).map_err(|e| {
            let message = e
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string());
            ProvisionError::validation_error("database.admin_password", message, None)
        })?;
        Ok(password)
    }

    /// ユーザー識別子からリソース名を確定する
    pub fn resolve_names(&self, user: &UserSlug) -> ProvisionResult<ResourceNames> {
        let names = ResourceNames::derive(&self.prefix, user).with_overrides(&self.names);
        names.validate().map_err(|e| match e {
            crate::domain::value_objects::resource_name::ResourceNameError::InvalidName {
                kind,
                name,
                rule,
            } => ProvisionError::validation_error(kind.to_string(), rule, Some(name)),
            other => ProvisionError::config_error(other.to_string()),
        })?;
        Ok(names)
    }

    /// 実行時刻を含むタグ一覧（`key=value`形式）
    pub fn tag_pairs(&self, provisioned_at: chrono::DateTime<chrono::Utc>) -> Vec<String> {
        let mut tags = self.tags.clone();
        tags.insert(
            "provisioned-at".to_string(),
            provisioned_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );
        tags.into_iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::from(message));
    error
}

fn validate_prefix_field(prefix: &str) -> Result<(), ValidationError> {
    validate_prefix(prefix).map_err(|e| invalid("prefix", e.to_string()))
}

fn validate_admin_user(user: &str) -> Result<(), ValidationError> {
    const RESERVED: [&str; 7] = [
        "azure_superuser",
        "azure_pg_admin",
        "admin",
        "administrator",
        "root",
        "guest",
        "public",
    ];

    let lowered = user.to_lowercase();
    let well_formed = !user.is_empty()
        && user.len() <= 63
        && user.starts_with(|c: char| c.is_ascii_alphabetic())
        && user.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !well_formed {
        return Err(invalid(
            "admin_user",
            format!("'{user}' must be 1-63 letters, digits or '_' starting with a letter"),
        ));
    }
    if RESERVED.contains(&lowered.as_str()) || lowered.starts_with("pg_") {
        return Err(invalid(
            "admin_user",
            format!("'{user}' is a reserved PostgreSQL user name"),
        ));
    }
    Ok(())
}

fn validate_admin_password(password: &Secret) -> Result<(), ValidationError> {
    let value = password.expose();
    let length = value.chars().count();
    if !(8..=128).contains(&length) {
        return Err(invalid(
            "admin_password",
            "password must be 8-128 characters long".to_string(),
        ));
    }

    let categories = [
        value.chars().any(|c| c.is_ascii_uppercase()),
        value.chars().any(|c| c.is_ascii_lowercase()),
        value.chars().any(|c| c.is_ascii_digit()),
        value.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    if categories.iter().filter(|present| **present).count() < 3 {
        return Err(invalid(
            "admin_password",
            "password must mix at least three of: uppercase, lowercase, digits, symbols"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_secret_name(name: &str) -> Result<(), ValidationError> {
    let well_formed = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !well_formed || name.to_uppercase().starts_with("GITHUB_") {
        return Err(invalid(
            "secret_name",
            format!("'{name}' is not a valid GitHub secret name"),
        ));
    }
    Ok(())
}

fn validate_repository(repository: &str) -> Result<(), ValidationError> {
    let mut parts = repository.split('/');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) => {
            let segment_ok = |s: &str| {
                !s.is_empty()
                    && s.chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            };
            segment_ok(owner) && segment_ok(repo)
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(invalid(
            "repository",
            format!("'{repository}' must have the form OWNER/REPO"),
        ))
    }
}
