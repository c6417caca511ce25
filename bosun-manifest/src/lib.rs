//! bosun manifest generation — ArgoCD AppProject/ApplicationSet pairs,
//! Vault SecretStore documents, and the cluster-resource bundle.
//!
//! Public API surface:
//! - [`argocd`] — CRD object model + multi-document helpers
//! - [`project`] — project-file and cluster-bundle generation
//! - [`secretstore`] — SecretStore CRD model
//! - [`error`] — [`ManifestError`]

pub mod argocd;
pub mod error;
pub mod project;
pub mod secretstore;

pub use argocd::{join_manifests, parse_project_file, AppProject, ApplicationSet, Metadata};
pub use error::ManifestError;
pub use project::{
    generate_app_project, generate_application_set, render_cluster_readme, render_project_file,
    ProjectManifestOptions, DEFAULT_REQUEUE_SECONDS,
};
pub use secretstore::{
    Provider, SecretStore, SecretStoreSpec, VaultProvider, DEFAULT_KV_VERSION, KIND_SECRET_STORE,
};
