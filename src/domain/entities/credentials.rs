use serde::{Deserialize, Serialize};

use crate::common::error::ProvisionError;
use crate::common::result::ProvisionResult;
use crate::domain::value_objects::secret::Secret;

/// `az ad sp create-for-rbac --sdk-auth`が出力する認証情報
///
/// GitHub Actionsの`azure/login`がそのまま読む形式なので、元のJSON文書を保持する。
#[derive(Debug, Clone)]
pub struct ServicePrincipalCredentials {
    pub client_id: String,
    pub subscription_id: String,
    pub tenant_id: String,
    document: Secret,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SdkAuthDocument {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    subscription_id: String,
    #[serde(default)]
    tenant_id: String,
}

impl ServicePrincipalCredentials {
    /// JSONを解析し、必須フィールドが揃っているか検証する
    pub fn parse(raw: &str) -> ProvisionResult<Self> {
        let document: SdkAuthDocument = serde_json::from_str(raw).map_err(|e| {
            ProvisionError::serialization_error_with_source(
                "Service principal credentials are not valid JSON",
                e,
            )
        })?;

        let missing: Vec<&str> = [
            ("clientId", &document.client_id),
            ("clientSecret", &document.client_secret),
            ("subscriptionId", &document.subscription_id),
            ("tenantId", &document.tenant_id),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(ProvisionError::validation_error(
                "service principal credentials",
                format!("missing {}", missing.join(", ")),
                None,
            ));
        }

        Ok(Self {
            client_id: document.client_id,
            subscription_id: document.subscription_id,
            tenant_id: document.tenant_id,
            document: Secret::new(raw.trim()),
        })
    }

    /// CIシークレットとして保存するJSON文書
    pub fn document(&self) -> &Secret {
        &self.document
    }
}

/// `az acr credential show`の出力
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryCredentials {
    pub username: String,
    #[serde(default)]
    pub passwords: Vec<RegistryPassword>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryPassword {
    pub name: String,
    pub value: Secret,
}

impl RegistryCredentials {
    pub fn parse(raw: &str) -> ProvisionResult<Self> {
        serde_json::from_str(raw).map_err(|e| {
            ProvisionError::serialization_error_with_source(
                "Registry credentials are not valid JSON",
                e,
            )
        })
    }

    /// `password`を優先し、無ければ最初のパスワードを返す
    pub fn primary_password(&self) -> ProvisionResult<&Secret> {
        self.passwords
            .iter()
            .find(|p| p.name == "password")
            .or_else(|| self.passwords.first())
            .map(|p| &p.value)
            .ok_or_else(|| {
                ProvisionError::validation_error(
                    "registry credentials",
                    "admin user has no password; is the admin user enabled?",
                    None,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDK_AUTH: &str = r#"{
  "clientId": "00000000-0000-0000-0000-000000000001",
  "clientSecret": "not-a-real-secret",
  "subscriptionId": "00000000-0000-0000-0000-000000000002",
  "tenantId": "00000000-0000-0000-0000-000000000003",
  "activeDirectoryEndpointUrl": "https://login.microsoftonline.com"
}"#;

    #[test]
    fn test_parse_sdk_auth() {
        let credentials = ServicePrincipalCredentials::parse(SDK_AUTH).unwrap();
        assert_eq!(credentials.client_id, "00000000-0000-0000-0000-000000000001");
        assert_eq!(credentials.tenant_id, "00000000-0000-0000-0000-000000000003");
        assert!(credentials.document().expose().contains("activeDirectoryEndpointUrl"));
        assert!(!format!("{:?}", credentials).contains("not-a-real-secret"));
    }

    #[test]
    fn test_parse_sdk_auth_missing_fields() {
        let error = ServicePrincipalCredentials::parse(r#"{"clientId": "abc"}"#).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Validation error: service principal credentials - missing clientSecret, subscriptionId, tenantId"
        );
    }

    #[test]
    fn test_parse_sdk_auth_not_json() {
        let error = ServicePrincipalCredentials::parse("WARNING: something").unwrap_err();
        assert!(matches!(error, ProvisionError::SerializationError { .. }));
    }

    #[test]
    fn test_registry_primary_password() {
        let raw = r#"{"username": "acrdemoalice", "passwords": [
            {"name": "password2", "value": "second"},
            {"name": "password", "value": "first"}
        ]}"#;
        let credentials = RegistryCredentials::parse(raw).unwrap();
        assert_eq!(credentials.username, "acrdemoalice");
        assert_eq!(credentials.primary_password().unwrap().expose(), "first");
    }

    #[test]
    fn test_registry_without_passwords() {
        let credentials = RegistryCredentials::parse(r#"{"username": "acr"}"#).unwrap();
        assert!(credentials.primary_password().is_err());
    }
}
