use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// リソース名関連のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceNameError {
    #[error("User identity '{0}' contains no usable characters (a-z, 0-9)")]
    EmptyUser(String),

    #[error("Invalid prefix '{0}': must start with a letter and contain 1-10 lowercase letters or digits")]
    InvalidPrefix(String),

    #[error("Invalid {kind} name '{name}': {rule}")]
    InvalidName {
        kind: ResourceKind,
        name: String,
        rule: &'static str,
    },
}

/// azprovが作成するAzureリソースの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    ResourceGroup,
    LogAnalyticsWorkspace,
    ContainerRegistry,
    ContainerAppsEnvironment,
    PostgresServer,
    ContainerApp,
    ServicePrincipal,
}

impl ResourceKind {
    /// 全種類（作成順）
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::ResourceGroup,
        ResourceKind::LogAnalyticsWorkspace,
        ResourceKind::ContainerRegistry,
        ResourceKind::ContainerAppsEnvironment,
        ResourceKind::PostgresServer,
        ResourceKind::ContainerApp,
        ResourceKind::ServicePrincipal,
    ];

    /// Azureが許容する最大文字数
    pub fn max_len(&self) -> usize {
        match self {
            ResourceKind::ResourceGroup => 90,
            ResourceKind::LogAnalyticsWorkspace => 63,
            ResourceKind::ContainerRegistry => 50,
            ResourceKind::ContainerAppsEnvironment => 60,
            ResourceKind::PostgresServer => 63,
            ResourceKind::ContainerApp => 32,
            ResourceKind::ServicePrincipal => 120,
        }
    }

    /// 命名規則の説明
    pub fn rule(&self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => {
                "1-90 letters, digits, '-', '_', '.', '(' or ')', not ending with '.'"
            }
            ResourceKind::LogAnalyticsWorkspace => {
                "4-63 letters, digits or '-', starting and ending with a letter or digit"
            }
            ResourceKind::ContainerRegistry => "5-50 letters or digits",
            ResourceKind::ContainerAppsEnvironment => {
                "2-60 lowercase letters, digits or '-', starting with a letter and ending with a letter or digit"
            }
            ResourceKind::PostgresServer => {
                "3-63 lowercase letters, digits or '-', starting and ending with a letter or digit"
            }
            ResourceKind::ContainerApp => {
                "2-32 lowercase letters, digits or '-', starting with a letter, ending with a letter or digit, no '--'"
            }
            ResourceKind::ServicePrincipal => "1-120 letters, digits, spaces, '.', '_' or '-'",
        }
    }

    fn pattern(&self) -> &'static Regex {
        static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            [
                r"^[A-Za-z0-9_\-\.\(\)]{0,89}[A-Za-z0-9_\-\(\)]$",
                r"^[A-Za-z0-9][A-Za-z0-9\-]{2,61}[A-Za-z0-9]$",
                r"^[A-Za-z0-9]{5,50}$",
                r"^[a-z][a-z0-9\-]{0,58}[a-z0-9]$",
                r"^[a-z0-9][a-z0-9\-]{1,61}[a-z0-9]$",
                r"^[a-z][a-z0-9\-]{0,30}[a-z0-9]$",
                r"^[A-Za-z0-9 ._\-]{1,120}$",
            ]
            .iter()
            .map(|p| Regex::new(p).expect("static resource name pattern"))
            .collect()
        });
        let index = Self::ALL
            .iter()
            .position(|kind| kind == self)
            .unwrap_or_default();
        &patterns[index]
    }

    /// 名前が命名規則を満たしているか検証する
    pub fn validate(&self, name: &str) -> Result<(), ResourceNameError> {
        let double_hyphen = *self == ResourceKind::ContainerApp && name.contains("--");
        if self.pattern().is_match(name) && !double_hyphen {
            Ok(())
        } else {
            Err(ResourceNameError::InvalidName {
                kind: *self,
                name: name.to_string(),
                rule: self.rule(),
            })
        }
    }

    /// 最大長に切り詰め、末尾のハイフンを除去する
    fn fit(&self, candidate: String) -> String {
        let truncated: String = candidate.chars().take(self.max_len()).collect();
        truncated.trim_end_matches('-').to_string()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::ResourceGroup => "resource group",
            ResourceKind::LogAnalyticsWorkspace => "log analytics workspace",
            ResourceKind::ContainerRegistry => "container registry",
            ResourceKind::ContainerAppsEnvironment => "container apps environment",
            ResourceKind::PostgresServer => "postgres flexible server",
            ResourceKind::ContainerApp => "container app",
            ResourceKind::ServicePrincipal => "service principal",
        };
        write!(f, "{}", label)
    }
}

/// プレフィックスの検証（`validator`のcustom関数としても利用）
pub fn validate_prefix(prefix: &str) -> Result<(), ResourceNameError> {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PREFIX.get_or_init(|| Regex::new(r"^[a-z][a-z0-9]{0,9}$").expect("static prefix pattern"));
    if pattern.is_match(prefix) {
        Ok(())
    } else {
        Err(ResourceNameError::InvalidPrefix(prefix.to_string()))
    }
}

/// ローカルユーザー名を正規化した識別子
///
/// 英数字以外を除去し小文字化する。グローバルに一意なリソース名の材料になる。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserSlug(String);

impl UserSlug {
    pub fn new(raw: &str) -> Result<Self, ResourceNameError> {
        let slug: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        if slug.is_empty() {
            return Err(ResourceNameError::EmptyUser(raw.to_string()));
        }
        Ok(Self(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 設定ファイルで個別に上書きできるリソース名
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NameOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_analytics_workspace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_registry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_apps_environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres_server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_principal: Option<String>,
}

/// 1回の実行で扱うリソース名一式
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceNames {
    pub resource_group: String,
    pub log_analytics_workspace: String,
    pub container_registry: String,
    pub container_apps_environment: String,
    pub postgres_server: String,
    pub container_app: String,
    pub service_principal: String,
}

impl ResourceNames {
    /// プレフィックスとユーザー識別子から既定の名前を導出する
    pub fn derive(prefix: &str, user: &UserSlug) -> Self {
        let user = user.as_str();
        Self {
            resource_group: ResourceKind::ResourceGroup.fit(format!("rg-{prefix}-{user}")),
            log_analytics_workspace: ResourceKind::LogAnalyticsWorkspace
                .fit(format!("log-{prefix}-{user}")),
            container_registry: ResourceKind::ContainerRegistry.fit(format!("acr{prefix}{user}")),
            container_apps_environment: ResourceKind::ContainerAppsEnvironment
                .fit(format!("cae-{prefix}-{user}")),
            postgres_server: ResourceKind::PostgresServer.fit(format!("psql-{prefix}-{user}")),
            container_app: ResourceKind::ContainerApp.fit(format!("ca-{prefix}-{user}")),
            service_principal: ResourceKind::ServicePrincipal.fit(format!("sp-{prefix}-{user}")),
        }
    }

    /// 上書き設定を適用する
    pub fn with_overrides(mut self, overrides: &NameOverrides) -> Self {
        let apply = |target: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                *target = value.clone();
            }
        };
        apply(&mut self.resource_group, &overrides.resource_group);
        apply(
            &mut self.log_analytics_workspace,
            &overrides.log_analytics_workspace,
        );
        apply(&mut self.container_registry, &overrides.container_registry);
        apply(
            &mut self.container_apps_environment,
            &overrides.container_apps_environment,
        );
        apply(&mut self.postgres_server, &overrides.postgres_server);
        apply(&mut self.container_app, &overrides.container_app);
        apply(&mut self.service_principal, &overrides.service_principal);
        self
    }

    pub fn get(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::ResourceGroup => &self.resource_group,
            ResourceKind::LogAnalyticsWorkspace => &self.log_analytics_workspace,
            ResourceKind::ContainerRegistry => &self.container_registry,
            ResourceKind::ContainerAppsEnvironment => &self.container_apps_environment,
            ResourceKind::PostgresServer => &self.postgres_server,
            ResourceKind::ContainerApp => &self.container_app,
            ResourceKind::ServicePrincipal => &self.service_principal,
        }
    }

    /// 全ての名前がAzureの命名規則を満たすか検証する
    pub fn validate(&self) -> Result<(), ResourceNameError> {
        ResourceKind::ALL
            .iter()
            .try_for_each(|kind| kind.validate(self.get(*kind)))
    }

    /// PostgreSQLサーバーのFQDN
    pub fn postgres_host(&self) -> String {
        format!("{}.postgres.database.azure.com", self.postgres_server)
    }
}
