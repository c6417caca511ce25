//! SecretStore object model — the Vault-backed external-secrets CRD shape.
//!
//! Only the Vault provider is modeled; any other provider key lands in the
//! flattened `unknown` map so validation can reject it without this crate
//! having to enumerate every provider the CRD supports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bosun_core::keys;

use crate::argocd::Metadata;
use crate::error::ManifestError;

pub const API_VERSION_EXTERNAL_SECRETS: &str = "external-secrets.io/v1beta1";
pub const KIND_SECRET_STORE: &str = "SecretStore";

/// Default Vault KV engine version.
pub const DEFAULT_KV_VERSION: &str = "v2";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretStore {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    pub spec: SecretStoreSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SecretStoreSpec {
    pub provider: Provider,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Provider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<VaultProvider>,
    /// Any non-vault provider key ends up here.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultProvider {
    pub server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default = "default_kv_version")]
    pub version: String,
    /// Opaque auth block, passed through untouched.
    #[serde(default, skip_serializing_if = "serde_yaml::Value::is_null")]
    pub auth: serde_yaml::Value,
}

fn default_kv_version() -> String {
    DEFAULT_KV_VERSION.to_owned()
}

// ---------------------------------------------------------------------------
// Impl
// ---------------------------------------------------------------------------

impl SecretStore {
    pub fn new(name: impl Into<String>, vault: VaultProvider) -> Self {
        Self {
            api_version: API_VERSION_EXTERNAL_SECRETS.to_owned(),
            kind: KIND_SECRET_STORE.to_owned(),
            metadata: Metadata {
                name: name.into(),
                labels: BTreeMap::from([(
                    keys::LABEL_MANAGED_BY.to_owned(),
                    keys::MANAGED_BY.to_owned(),
                )]),
                ..Default::default()
            },
            spec: SecretStoreSpec {
                provider: Provider {
                    vault: Some(vault),
                    unknown: BTreeMap::new(),
                },
            },
        }
    }

    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// True when the store declares the Vault provider and nothing else.
    pub fn is_vault_only(&self) -> bool {
        self.spec.provider.vault.is_some() && self.spec.provider.unknown.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// The server-assigned identifier annotation, when present.
    pub fn id(&self) -> Option<&str> {
        self.metadata
            .annotations
            .get(keys::ANNOTATION_ID)
            .map(String::as_str)
    }

    pub fn set_annotation(&mut self, key: &str, value: impl Into<String>) {
        self.metadata
            .annotations
            .insert(key.to_owned(), value.into());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
