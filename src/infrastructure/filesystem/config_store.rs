use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs as async_fs;

use crate::common::error::ProvisionError;
use crate::domain::entities::provision_config::ProvisionConfig;

/// Config store related errors
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Config file not found at path: {0}")]
    ConfigFileNotFound(String),

    #[error("Unsupported config file format '{0}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),

    #[error("Config file read failed: {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parsing failed in {path}: {source}")]
    YamlParsingFailed {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("JSON parsing failed in {path}: {source}")]
    JsonParsingFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ConfigStoreError> for ProvisionError {
    fn from(error: ConfigStoreError) -> Self {
        ProvisionError::config_error_with_source(error.to_string(), error)
    }
}

/// Supported config file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigStoreError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            other => Err(ConfigStoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Loads `ProvisionConfig` files
#[derive(Debug, Default)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Defaults when `path` is `None`, otherwise defaults overlaid with the file
    pub async fn load(&self, path: Option<&Path>) -> Result<ProvisionConfig, ConfigStoreError> {
        match path {
            None => Ok(ProvisionConfig::default()),
            Some(path) => self.read_config(path).await,
        }
    }

    pub async fn read_config(&self, path: &Path) -> Result<ProvisionConfig, ConfigStoreError> {
        if !async_fs::try_exists(path).await.unwrap_or(false) {
            return Err(ConfigStoreError::ConfigFileNotFound(
                path.display().to_string(),
            ));
        }

        let format = ConfigFormat::from_path(path)?;
        let content =
            async_fs::read_to_string(path)
                .await
                .map_err(|source| ConfigStoreError::ReadFailed {
                    path: path.display().to_string(),
                    source,
                })?;

        let config = Self::parse(&content, format, path)?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    pub fn parse(
        content: &str,
        format: ConfigFormat,
        path: &Path,
    ) -> Result<ProvisionConfig, ConfigStoreError> {
        // An empty YAML document means "all defaults".
        if content.trim().is_empty() {
            return Ok(ProvisionConfig::default());
        }

        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|source| {
                ConfigStoreError::YamlParsingFailed {
                    path: path.display().to_string(),
                    source,
                }
            }),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|source| {
                ConfigStoreError::JsonParsingFailed {
                    path: path.display().to_string(),
                    source,
                }
            }),
        }
    }

    /// Resolve a relative path against the config file's directory
    pub fn resolve_relative(config_path: Option<&Path>, target: &Path) -> PathBuf {
        if target.is_absolute() {
            return target.to_path_buf();
        }
        match config_path.and_then(Path::parent) {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(target),
            _ => target.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::provision_config::Ingress;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_defaults_without_file() {
        let config = ConfigStore::new().load(None).await.unwrap();
        assert_eq!(config.prefix, "demo");
        assert_eq!(config.location, "westeurope");
    }

    #[tokio::test]
    async fn test_load_yaml_overlays_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("azprov.yaml");
        std::fs::write(
            &path,
            r#"
prefix: shop
location: northeurope
names:
  container_registry: shopregistry01
database:
  admin_user: shopadmin
  storage_size_gb: 64
container_app:
  ingress: internal
github:
  repository: acme/shop
"#,
        )
        .unwrap();

        let config = ConfigStore::new().load(Some(&path)).await.unwrap();
        assert_eq!(config.prefix, "shop");
        assert_eq!(config.location, "northeurope");
        assert_eq!(
            config.names.container_registry.as_deref(),
            Some("shopregistry01")
        );
        assert_eq!(config.database.admin_user, "shopadmin");
        assert_eq!(config.database.storage_size_gb, 64);
        assert_eq!(config.database.sku_name, "Standard_B1ms");
        assert_eq!(config.container_app.ingress, Ingress::Internal);
        assert_eq!(config.github.repository.as_deref(), Some("acme/shop"));
        assert_eq!(config.github.secrets.azure_credentials, "AZURE_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_load_can_disable_prerequisites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("azprov.yaml");
        std::fs::write(&path, "install_prerequisites: false\n").unwrap();

        let config = ConfigStore::new().load(Some(&path)).await.unwrap();
        assert!(!config.install_prerequisites);
        assert_eq!(config.prefix, "demo");
    }

    #[tokio::test]
    async fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("azprov.json");
        std::fs::write(&path, r#"{"location": "eastus", "command_timeout_secs": 600}"#).unwrap();

        let config = ConfigStore::new().load(Some(&path)).await.unwrap();
        assert_eq!(config.location, "eastus");
        assert_eq!(config.command_timeout_secs, Some(600));
    }

    #[tokio::test]
    async fn test_unknown_field_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("azprov.yml");
        std::fs::write(&path, "locaton: eastus\n").unwrap();

        let error = ConfigStore::new().load(Some(&path)).await.unwrap_err();
        assert!(matches!(error, ConfigStoreError::YamlParsingFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let error = ConfigStore::new()
            .load(Some(Path::new("/nonexistent/azprov.yaml")))
            .await
            .unwrap_err();
        assert!(matches!(error, ConfigStoreError::ConfigFileNotFound(_)));
    }

    #[test]
    fn test_unsupported_format() {
        assert!(matches!(
            ConfigFormat::from_path(Path::new("azprov.toml")),
            Err(ConfigStoreError::UnsupportedFormat(ext)) if ext == "toml"
        ));
    }

    #[test]
    fn test_resolve_relative() {
        let config = Path::new("/work/ops/azprov.yaml");
        assert_eq!(
            ConfigStore::resolve_relative(Some(config), Path::new("db/init.sql")),
            PathBuf::from("/work/ops/db/init.sql")
        );
        assert_eq!(
            ConfigStore::resolve_relative(Some(config), Path::new("/abs/init.sql")),
            PathBuf::from("/abs/init.sql")
        );
        assert_eq!(
            ConfigStore::resolve_relative(None, Path::new("db/init.sql")),
            PathBuf::from("db/init.sql")
        );
    }
}
