//! Repository bootstrap.
//!
//! A meta repository must carry the ArgoCD bootstrap marker before any
//! project can be created; the marker's namespace is where every
//! generated AppProject and ApplicationSet lands. Bootstrap seeds the
//! marker, the in-cluster resource bundle, and README scaffolding in one
//! commit.

use std::path::PathBuf;

use bosun_core::types::ClusterConfig;
use bosun_manifest::render_cluster_readme;
use bosun_repo::{BulkWrite, CloneMode, RepoFs};
use serde::{Deserialize, Serialize};

use crate::error::WriterError;
use crate::RepoWriter;

pub const BOOTSTRAP_COMMIT: &str = "chore: bootstrap gitops repository";

const DEFAULT_NAMESPACE: &str = "argocd";
const KUSTOMIZE_API_VERSION: &str = "kustomize.config.k8s.io/v1beta1";
const KIND_KUSTOMIZATION: &str = "Kustomization";

const APPS_README: &str = "# Applications\n\nOne application per subdirectory. \
Descriptor files under each project's\ndirectory are watched by that project's \
ApplicationSet.\n";

const PROJECTS_README: &str = "# Projects\n\nOne file per project, holding its \
AppProject and ApplicationSet pair.\n";

/// The `bootstrap/argo-cd/kustomization.yaml` marker. Only the namespace
/// is meaningful to the writer; resources belong to the installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Kustomization {
    api_version: String,
    kind: String,
    #[serde(default)]
    namespace: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    resources: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub namespace: String,
    pub dry_run: bool,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            dry_run: false,
        }
    }
}

#[derive(Debug)]
pub enum BootstrapOutcome {
    Pushed { revision: String },
    WouldWrite { files: Vec<PathBuf> },
}

impl RepoWriter {
    /// Seeds the meta repository with the bootstrap marker and the
    /// in-cluster resource bundle.
    pub fn bootstrap(&self, opts: &BootstrapOptions) -> Result<BootstrapOutcome, WriterError> {
        let mode = if opts.dry_run {
            CloneMode::Read
        } else {
            CloneMode::Write
        };
        let handle = self.open_meta(mode)?;
        if handle.fs.exists(self.layout.argocd_marker()) {
            return Err(WriterError::AlreadyBootstrapped {
                path: self.installation_path().to_string(),
            });
        }

        let namespace = if opts.namespace.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            &opts.namespace
        };
        let writes = self.bootstrap_writes(namespace)?;
        if opts.dry_run {
            return Ok(BootstrapOutcome::WouldWrite {
                files: writes.into_iter().map(|w| w.path).collect(),
            });
        }

        handle.fs.bulk_write(&writes)?;
        let revision = handle.repo.persist(BOOTSTRAP_COMMIT)?;
        tracing::info!(%revision, "bootstrapped gitops repository");
        Ok(BootstrapOutcome::Pushed { revision })
    }

    fn bootstrap_writes(&self, namespace: &str) -> Result<Vec<BulkWrite>, WriterError> {
        let layout = &self.layout;
        let marker = serde_yaml::to_string(&Kustomization {
            api_version: KUSTOMIZE_API_VERSION.to_string(),
            kind: KIND_KUSTOMIZATION.to_string(),
            namespace: namespace.to_string(),
            resources: Vec::new(),
        })?;
        let cluster = ClusterConfig {
            name: layout.default_context.clone(),
            server: layout.default_server.clone(),
        };
        let mut cluster_json = serde_json::to_vec_pretty(&cluster)?;
        cluster_json.push(b'\n');
        let readme = render_cluster_readme(&layout.default_context, &layout.default_server)?;

        Ok(vec![
            BulkWrite::new(layout.argocd_marker(), marker),
            BulkWrite::new(layout.cluster_config_file(&layout.default_context), cluster_json),
            BulkWrite::new(layout.cluster_readme(&layout.default_context), readme),
            BulkWrite::new(layout.apps_dir().join("README.md"), APPS_README),
            BulkWrite::new(layout.projects_dir().join("README.md"), PROJECTS_README),
        ])
    }

    /// Namespace ArgoCD is installed in, read from the bootstrap marker.
    /// A missing marker means the repository was never bootstrapped and
    /// every project operation must refuse to proceed.
    pub(crate) fn installation_namespace(&self, meta_fs: &RepoFs) -> Result<String, WriterError> {
        let marker = self.layout.argocd_marker();
        if !meta_fs.exists(&marker) {
            return Err(WriterError::NotBootstrapped {
                path: self.installation_path().to_string(),
            });
        }
        let kustomization: Kustomization = serde_yaml::from_str(&meta_fs.read_to_string(&marker)?)?;
        if kustomization.namespace.is_empty() {
            Ok(DEFAULT_NAMESPACE.to_string())
        } else {
            Ok(kustomization.namespace)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{seed_bootstrap, FakeOpener, META_URL};
    use bosun_repo::RepoRef;

    fn writer(opener: &std::sync::Arc<FakeOpener>) -> RepoWriter {
        RepoWriter::new(opener.clone(), RepoRef::new(META_URL))
    }

    #[test]
    fn bootstrap_seeds_marker_and_cluster_bundle() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);

        let outcome = writer.bootstrap(&BootstrapOptions::default()).unwrap();
        assert!(matches!(outcome, BootstrapOutcome::Pushed { .. }));

        let fs = opener.seed_fs(META_URL);
        let marker = fs
            .read_to_string("bootstrap/argo-cd/kustomization.yaml")
            .unwrap();
        assert!(marker.contains("namespace: argocd"));
        assert!(fs.exists("bootstrap/cluster-resources/in-cluster.json"));
        assert!(fs.exists("bootstrap/cluster-resources/in-cluster/README.md"));
        assert!(fs.exists("apps/README.md"));
        assert!(fs.exists("projects/README.md"));
        assert_eq!(opener.persisted(META_URL), vec![BOOTSTRAP_COMMIT.to_string()]);
    }

    #[test]
    fn bootstrap_twice_is_a_conflict() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);

        writer.bootstrap(&BootstrapOptions::default()).unwrap();
        let err = writer.bootstrap(&BootstrapOptions::default()).unwrap_err();
        assert!(matches!(err, WriterError::AlreadyBootstrapped { .. }));
    }

    #[test]
    fn dry_run_lists_files_without_writing() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);

        let opts = BootstrapOptions {
            dry_run: true,
            ..BootstrapOptions::default()
        };
        let outcome = writer.bootstrap(&opts).unwrap();
        match outcome {
            BootstrapOutcome::WouldWrite { files } => {
                assert!(files.contains(&PathBuf::from("bootstrap/argo-cd/kustomization.yaml")));
            }
            other => panic!("expected WouldWrite, got {:?}", other),
        }
        assert!(!opener.seed_fs(META_URL).exists("bootstrap"));
        assert!(opener.persisted(META_URL).is_empty());
    }

    #[test]
    fn custom_namespace_lands_in_the_marker() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);

        let opts = BootstrapOptions {
            namespace: "gitops".to_string(),
            dry_run: false,
        };
        writer.bootstrap(&opts).unwrap();

        let fs = opener.seed_fs(META_URL);
        assert_eq!(writer.installation_namespace(&fs).unwrap(), "gitops");
    }

    #[test]
    fn missing_marker_yields_guidance() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);
        let fs = opener.seed_fs(META_URL);

        let err = writer.installation_namespace(&fs).unwrap_err();
        assert!(matches!(err, WriterError::NotBootstrapped { .. }));
        assert!(err.to_string().contains("bosun repo bootstrap"));
    }

    #[test]
    fn seeded_marker_namespace_is_read_back() {
        let opener = FakeOpener::new();
        let writer = writer(&opener);
        let fs = opener.seed_fs(META_URL);
        seed_bootstrap(&fs, "argocd");

        assert_eq!(writer.installation_namespace(&fs).unwrap(), "argocd");
    }
}
