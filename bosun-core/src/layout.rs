//! Path conventions for the managed gitops repository.
//!
//! Every operation resolves its target paths through a [`Layout`] value
//! assembled once at startup, never through ad-hoc string joins:
//!
//! ```text
//! <root>/
//!   projects/<project>.yaml                    AppProject + ApplicationSet
//!   apps/<app>/overlays/<project>/config.json  shared-repo layout
//!   apps/<app>/<project>/config.json           split-repo layout
//!   bootstrap/
//!     argo-cd/kustomization.yaml               bootstrap marker
//!     cluster-resources/
//!       <context>.json                         cluster descriptor
//!       <context>/README.md
//!       <context>/ss-<id>.yaml                 secret stores
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Application layout
// ---------------------------------------------------------------------------

/// Where an application's per-project subdirectory lives. Decided once at
/// creation from repository identity and honored by every later operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLayout {
    /// Meta and tenant repositories coincide: `apps/<app>/overlays/<project>`.
    Overlay,
    /// Split repositories: `apps/<app>/<project>`.
    Flat,
}

impl AppLayout {
    /// The layout implied by comparing meta and tenant remote URLs.
    pub fn for_shared_repo(shared: bool) -> Self {
        if shared {
            AppLayout::Overlay
        } else {
            AppLayout::Flat
        }
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Immutable path/layout constants, threaded through constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub apps_dir: String,
    pub projects_dir: String,
    pub overlays_dir: String,
    pub bootstrap_dir: String,
    pub argocd_dir: String,
    pub cluster_resources_dir: String,
    /// Context name for the cluster ArgoCD itself runs in.
    pub default_context: String,
    /// API server URL for the in-cluster context.
    pub default_server: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            apps_dir: "apps".to_owned(),
            projects_dir: "projects".to_owned(),
            overlays_dir: "overlays".to_owned(),
            bootstrap_dir: "bootstrap".to_owned(),
            argocd_dir: "argo-cd".to_owned(),
            cluster_resources_dir: "cluster-resources".to_owned(),
            default_context: "in-cluster".to_owned(),
            default_server: "https://kubernetes.default.svc".to_owned(),
        }
    }
}

impl Layout {
    // -- projects ----------------------------------------------------------

    pub fn projects_dir(&self) -> PathBuf {
        PathBuf::from(&self.projects_dir)
    }

    pub fn project_file(&self, name: &str) -> PathBuf {
        self.projects_dir().join(format!("{name}.yaml"))
    }

    /// Glob matching every project file.
    pub fn project_glob(&self) -> String {
        format!("{}/*.yaml", self.projects_dir)
    }

    // -- applications ------------------------------------------------------

    pub fn apps_dir(&self) -> PathBuf {
        PathBuf::from(&self.apps_dir)
    }

    pub fn app_dir(&self, app: &str) -> PathBuf {
        self.apps_dir().join(app)
    }

    /// The overlay container of an application (shared-repo layout only).
    pub fn overlays_dir(&self, app: &str) -> PathBuf {
        self.app_dir(app).join(&self.overlays_dir)
    }

    /// The directory owned by one (app, project) pair under the given layout.
    pub fn app_project_dir(&self, app: &str, project: &str, layout: AppLayout) -> PathBuf {
        self.apps_dir().join(self.project_subdir(app, project, layout))
    }

    /// Same as [`Layout::app_project_dir`], relative to the apps directory;
    /// this is the form used on an apps-scoped view.
    pub fn project_subdir(&self, app: &str, project: &str, layout: AppLayout) -> PathBuf {
        match layout {
            AppLayout::Overlay => PathBuf::from(app).join(&self.overlays_dir).join(project),
            AppLayout::Flat => PathBuf::from(app).join(project),
        }
    }

    /// Glob matching every application's per-project directory.
    pub fn project_dir_glob(&self, project: &str, layout: AppLayout) -> String {
        match layout {
            AppLayout::Overlay => {
                format!("{}/*/{}/{}", self.apps_dir, self.overlays_dir, project)
            }
            AppLayout::Flat => format!("{}/*/{}", self.apps_dir, project),
        }
    }

    /// Generator glob for the ApplicationSet git-file generators; recursive
    /// because applications may nest arbitrarily below `apps/`.
    pub fn generator_glob(&self, install_path: &str, project: &str, file: &str) -> String {
        let glob = format!("{}/**/{}/{}", self.apps_dir, project, file);
        if install_path.is_empty() {
            glob
        } else {
            format!("{}/{}", install_path.trim_end_matches('/'), glob)
        }
    }

    // -- bootstrap and cluster resources -----------------------------------

    pub fn bootstrap_dir(&self) -> PathBuf {
        PathBuf::from(&self.bootstrap_dir)
    }

    /// The bootstrap marker whose `namespace` field records where the
    /// reconciler runs.
    pub fn argocd_marker(&self) -> PathBuf {
        self.bootstrap_dir()
            .join(&self.argocd_dir)
            .join("kustomization.yaml")
    }

    pub fn cluster_resources_dir(&self) -> PathBuf {
        self.bootstrap_dir().join(&self.cluster_resources_dir)
    }

    pub fn cluster_context_dir(&self, context: &str) -> PathBuf {
        self.cluster_resources_dir().join(context)
    }

    pub fn cluster_config_file(&self, context: &str) -> PathBuf {
        self.cluster_resources_dir().join(format!("{context}.json"))
    }

    pub fn cluster_readme(&self, context: &str) -> PathBuf {
        self.cluster_context_dir(context).join("README.md")
    }

    // -- secret stores -----------------------------------------------------

    pub fn secret_store_file(&self, context: &str, id: &str) -> PathBuf {
        self.cluster_context_dir(context).join(format!("ss-{id}.yaml"))
    }

    /// Glob matching every secret-store file for one cluster context.
    pub fn secret_store_glob(&self, context: &str) -> String {
        format!(
            "{}/{}/{}/ss-*.yaml",
            self.bootstrap_dir, self.cluster_resources_dir, context
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
