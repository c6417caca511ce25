//! Domain types for the bosun gitops writer.
//!
//! Everything that is persisted to or parsed from the managed repository is
//! serializable via serde; descriptor files (`config.json` / `config_dir.json`)
//! use camelCase field names because the ApplicationSet git-file generators
//! template directly from them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a project (tenant) in the meta repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed name for an application directory under `apps/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppName(pub String);

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for AppName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AppName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed secret-store identifier (assigned by the writer, never
/// by the client).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(pub String);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for StoreId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StoreId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The kind of an application source checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Helm,
    Kustomize,
    #[default]
    Directory,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Helm => write!(f, "helm"),
            SourceKind::Kustomize => write!(f, "kustomize"),
            SourceKind::Directory => write!(f, "directory"),
        }
    }
}

/// How a multi-environment application is installed into the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// One rendered manifest per environment, written flat.
    #[default]
    Flatten,
    /// Environment directories are kept nested (not supported by the
    /// multi-environment variant).
    Nested,
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallMode::Flatten => write!(f, "flatten"),
            InstallMode::Nested => write!(f, "nested"),
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor files
// ---------------------------------------------------------------------------

/// `config.json` — the per-application descriptor the single-manifest
/// git-file generator templates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub app_name: String,
    pub user_given_name: String,
    pub dest_namespace: String,
    pub dest_server: String,
    pub src_path: String,
    #[serde(rename = "srcRepoURL")]
    pub src_repo_url: String,
    pub src_target_revision: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// `config_dir.json` — descriptor for directory-source applications; the
/// extra glob fields feed the directory-source generator template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppDirConfig {
    #[serde(flatten)]
    pub config: AppConfig,
    #[serde(default)]
    pub exclude: String,
    #[serde(default)]
    pub include: String,
}

/// `<context>.json` — per-destination-cluster descriptor under
/// `bootstrap/cluster-resources/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    pub name: String,
    pub server: String,
}

// ---------------------------------------------------------------------------
// Response entities
// ---------------------------------------------------------------------------

/// Where an application's manifests come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub repo: String,
    pub path: String,
    pub target_revision: String,
}

/// User-facing metadata attached at application creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppInstantiation {
    pub user_given_name: String,
    pub tenant_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One deployment destination of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployTarget {
    pub cluster: String,
    pub namespace: String,
}

/// Reconciliation status placeholder; populated by an external status
/// collaborator, never by the writer itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    pub health: String,
    pub sync_status: String,
}

impl Default for RuntimeStatus {
    fn default() -> Self {
        Self {
            health: "unknown".to_owned(),
            sync_status: "unknown".to_owned(),
        }
    }
}

/// An application as reported by list/get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: AppName,
    pub source: SourceRef,
    pub instantiation: AppInstantiation,
    pub targets: Vec<DeployTarget>,
    pub runtime: RuntimeStatus,
}

/// A project (tenant) as reported by list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSummary {
    pub name: ProjectName,
    pub namespace: String,
    pub default_cluster: String,
    pub gitops_repo: String,
}

/// A whitelisted resource group/kind pair on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceKind {
    pub group: String,
    pub kind: String,
}

/// A project (tenant) as reported by get — the summary plus the AppProject
/// detail fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantDetail {
    #[serde(flatten)]
    pub summary: TenantSummary,
    pub description: String,
    pub source_repos: Vec<String>,
    pub cluster_resource_whitelist: Vec<ResourceKind>,
    pub namespace_resource_whitelist: Vec<ResourceKind>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
