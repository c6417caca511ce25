//! ArgoCD object model — the subset of the AppProject and ApplicationSet
//! CRD schemas this writer generates and parses back.
//!
//! Field names serialize exactly as the reconciler expects (camelCase,
//! `repoURL`); empty collections are omitted so generated YAML stays close
//! to what an operator would write by hand.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use bosun_core::ResourceKind;

use crate::error::ManifestError;

pub const API_VERSION_ARGOPROJ: &str = "argoproj.io/v1alpha1";
pub const KIND_APP_PROJECT: &str = "AppProject";
pub const KIND_APPLICATION_SET: &str = "ApplicationSet";

// ---------------------------------------------------------------------------
// Shared metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// AppProject
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppProject {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    pub spec: AppProjectSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppProjectSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_repos: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destinations: Vec<ProjectDestination>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_resource_whitelist: Vec<ResourceKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespace_resource_whitelist: Vec<ResourceKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDestination {
    pub server: String,
    pub namespace: String,
}

// ---------------------------------------------------------------------------
// ApplicationSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSet {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    pub spec: AppSetSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppSetSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generators: Vec<Generator>,
    pub template: AppTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<AppSetSyncPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppSetSyncPolicy {
    pub preserve_resources_on_deletion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generator {
    pub git: GitGenerator,
}

/// A git-file generator: one managed application per descriptor file
/// matching the glob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GitGenerator {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub revision: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<GitFileItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requeue_after_seconds: Option<u64>,
    /// Per-generator template override (directory-source generator).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<AppTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitFileItem {
    pub path: String,
}

// ---------------------------------------------------------------------------
// Application template
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppTemplate {
    #[serde(default)]
    pub metadata: Metadata,
    pub spec: AppSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<DestinationSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<SyncPolicy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_differences: Vec<IgnoreDifference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_revision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<DirectorySpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DirectorySpec {
    pub recurse: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exclude: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub include: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationSpec {
    pub server: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SyncPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated: Option<AutomatedSync>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AutomatedSync {
    pub prune: bool,
    pub self_heal: bool,
    pub allow_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreDifference {
    pub group: String,
    pub kind: String,
    pub json_pointers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Multi-document helpers
// ---------------------------------------------------------------------------

/// Join YAML documents into one multi-document manifest.
pub fn join_manifests(docs: &[String]) -> String {
    let parts: Vec<&str> = docs
        .iter()
        .map(|d| d.trim_end())
        .filter(|d| !d.is_empty())
        .collect();
    let mut joined = parts.join("\n---\n");
    joined.push('\n');
    joined
}

fn from_document<T: DeserializeOwned>(value: serde_yaml::Value) -> Result<T, ManifestError> {
    Ok(serde_yaml::from_value(value)?)
}

/// Parse one project file: a multi-document manifest holding exactly one
/// AppProject and one ApplicationSet, in either order.
pub fn parse_project_file(text: &str) -> Result<(AppProject, ApplicationSet), ManifestError> {
    let mut project: Option<AppProject> = None;
    let mut appset: Option<ApplicationSet> = None;

    for doc in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(doc)?;
        let kind = value
            .get("kind")
            .and_then(serde_yaml::Value::as_str)
            .unwrap_or_default()
            .to_owned();
        match kind.as_str() {
            KIND_APP_PROJECT => project = Some(from_document(value)?),
            KIND_APPLICATION_SET => appset = Some(from_document(value)?),
            _ => {}
        }
    }

    let project = project.ok_or(ManifestError::MissingDocument {
        kind: KIND_APP_PROJECT,
    })?;
    let appset = appset.ok_or(ManifestError::MissingDocument {
        kind: KIND_APPLICATION_SET,
    })?;
    Ok((project, appset))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_omits_empty_fields() {
        let yaml = serde_yaml::to_string(&Metadata {
            name: "teama".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(yaml, "name: teama\n");
    }

    #[test]
    fn git_generator_serializes_repo_url_field() {
        let gen = GitGenerator {
            repo_url: "https://github.com/org/infra.git".into(),
            revision: "main".into(),
            files: vec![GitFileItem {
                path: "apps/**/teama/config.json".into(),
            }],
            requeue_after_seconds: Some(20),
            template: None,
        };
        let yaml = serde_yaml::to_string(&gen).unwrap();
        assert!(yaml.contains("repoURL: https://github.com/org/infra.git"));
        assert!(yaml.contains("requeueAfterSeconds: 20"));
    }

    #[test]
    fn join_manifests_separates_documents() {
        let joined = join_manifests(&["a: 1\n".to_owned(), "b: 2\n".to_owned()]);
        assert_eq!(joined, "a: 1\n---\nb: 2\n");
    }

    #[test]
    fn parse_project_file_accepts_either_order() {
        let appset = "apiVersion: argoproj.io/v1alpha1\nkind: ApplicationSet\nmetadata:\n  name: teama\nspec:\n  template:\n    spec: {}\n";
        let project = "apiVersion: argoproj.io/v1alpha1\nkind: AppProject\nmetadata:\n  name: teama\nspec: {}\n";
        let text = join_manifests(&[appset.to_owned(), project.to_owned()]);

        let (proj, set) = parse_project_file(&text).unwrap();
        assert_eq!(proj.metadata.name, "teama");
        assert_eq!(set.metadata.name, "teama");
    }

    #[test]
    fn parse_project_file_requires_both_documents() {
        let only_project =
            "apiVersion: argoproj.io/v1alpha1\nkind: AppProject\nmetadata:\n  name: a\nspec: {}\n";
        let err = parse_project_file(only_project).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingDocument {
                kind: KIND_APPLICATION_SET
            }
        ));
    }
}
