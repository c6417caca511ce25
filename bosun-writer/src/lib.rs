//! Write-side operations over the gitops repositories.
//!
//! Every mutation follows the same shape: open the repositories the
//! operation touches through a [`RepoOpener`], validate against the
//! checked-out tree, stage file changes through the scoped views, then
//! persist with a single commit and push per repository touched.
//!
//! Repository roles:
//!
//! ```text
//! meta repo    projects/, bootstrap/           control-plane state
//! tenant repo  apps/                           application descriptors
//! source repo  charts, kustomizations, YAML    read-only input
//! ```
//!
//! When the tenant reference points at the meta repository's URL the two
//! roles collapse onto one clone and applications install under
//! `apps/<app>/overlays/<project>/`; with distinct URLs they install under
//! `apps/<app>/<project>/`. The layout picked at creation drives every
//! later read, list, and delete.

use std::sync::Arc;

use bosun_core::layout::{AppLayout, Layout};
use bosun_repo::{CloneMode, RepoFs, RepoHandle, RepoOpener, RepoRef};

pub mod app;
pub mod bootstrap;
pub mod error;
pub mod project;
pub mod secretstore;
pub mod source;
pub mod variant;

#[cfg(test)]
pub(crate) mod testkit;

pub use app::{AppCreateOptions, AppCreated, EnvReport};
pub use bootstrap::{BootstrapOptions, BootstrapOutcome};
pub use error::{ErrorKind, WriterError};
pub use project::{ClusterEndpoint, ClusterRegistrar, ProjectCreateOptions, ProjectOutcome};
pub use secretstore::StorePatch;
pub use source::{AppSource, RawManifestSource, SourceError};
pub use variant::{AppVariant, DirectoryApp, HelmMultiEnvApp, KustomizeApp};

/// The writer over one meta repository and an optional separate tenant
/// repository. Cheap to construct; every operation opens fresh or cached
/// clones through the opener, so a writer holds no repository state of
/// its own.
pub struct RepoWriter {
    layout: Layout,
    opener: Arc<dyn RepoOpener>,
    meta: RepoRef,
    tenant: Option<RepoRef>,
}

impl RepoWriter {
    pub fn new(opener: Arc<dyn RepoOpener>, meta: RepoRef) -> Self {
        Self {
            layout: Layout::default(),
            opener,
            meta,
            tenant: None,
        }
    }

    /// Route application descriptors to a separate tenant repository.
    /// Passing a reference with the meta URL keeps the single-repo layout.
    pub fn with_tenant(mut self, tenant: RepoRef) -> Self {
        self.tenant = Some(tenant);
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn meta_ref(&self) -> &RepoRef {
        &self.meta
    }

    /// The reference application descriptors live under; the meta
    /// reference when no tenant repository is configured.
    pub fn tenant_ref(&self) -> &RepoRef {
        self.tenant.as_ref().unwrap_or(&self.meta)
    }

    pub fn shared_repo(&self) -> bool {
        self.tenant_ref().same_repository(&self.meta)
    }

    pub fn app_layout(&self) -> AppLayout {
        AppLayout::for_shared_repo(self.shared_repo())
    }

    fn open(&self, reference: &RepoRef, mode: CloneMode) -> Result<RepoHandle, WriterError> {
        let mut reference = reference.clone();
        reference.mode = mode;
        Ok(self.opener.open(&reference)?)
    }

    pub(crate) fn open_meta(&self, mode: CloneMode) -> Result<RepoHandle, WriterError> {
        self.open(&self.meta, mode)
    }

    pub(crate) fn open_apps(&self, mode: CloneMode) -> Result<RepoHandle, WriterError> {
        self.open(self.tenant_ref(), mode)
    }

    /// The install path surfaced in guidance errors.
    pub(crate) fn installation_path(&self) -> &str {
        let path = self.meta.install_path();
        if path.is_empty() {
            "."
        } else {
            path
        }
    }

    /// Validates that a project exists on the meta view.
    pub(crate) fn require_project(&self, meta_fs: &RepoFs, project: &str) -> Result<(), WriterError> {
        if project.is_empty() {
            return Err(WriterError::EmptyProjectName);
        }
        if !meta_fs.exists(self.layout.project_file(project)) {
            return Err(WriterError::ProjectNotFound {
                name: project.to_string(),
            });
        }
        Ok(())
    }
}
