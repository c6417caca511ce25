//! Application variants.
//!
//! Creation supports three source shapes. Each writes a descriptor file
//! into the (app, project) directory; the multi-environment variant also
//! writes one pre-rendered manifest per environment. The descriptor, not
//! the manifests, is what the generated ApplicationSet watches.

use std::collections::BTreeMap;

use bosun_core::layout::{AppLayout, Layout};
use bosun_core::types::{AppConfig, AppDirConfig, InstallMode};
use bosun_repo::RepoFs;

use crate::error::WriterError;
use crate::source::AppSource;

/// Descriptor written by the helm and kustomize variants.
pub const CONFIG_FILE: &str = "config.json";

/// Descriptor written by the directory variant.
pub const CONFIG_DIR_FILE: &str = "config_dir.json";

const MANIFEST_DIR: &str = "manifests";

static EMPTY_MANIFESTS: BTreeMap<String, Vec<u8>> = BTreeMap::new();
static EMPTY_ERRORS: BTreeMap<String, String> = BTreeMap::new();

/// Multi-environment application with manifests rendered at creation
/// time. Environments that fail to render are recorded, not fatal; the
/// caller decides whether a partial result is acceptable.
#[derive(Debug)]
pub struct HelmMultiEnvApp {
    pub config: AppConfig,
    pub environments: Vec<String>,
    manifests: BTreeMap<String, Vec<u8>>,
    errors: BTreeMap<String, String>,
}

impl HelmMultiEnvApp {
    pub fn render(
        config: AppConfig,
        environments: Vec<String>,
        install_mode: InstallMode,
        source: &dyn AppSource,
    ) -> Result<Self, WriterError> {
        if environments.is_empty() {
            return Err(WriterError::NoEnvironments);
        }
        if install_mode != InstallMode::Flatten {
            return Err(WriterError::UnsupportedInstallMode {
                mode: install_mode.to_string(),
            });
        }
        let mut manifests = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for environment in &environments {
            match source.manifest(environment) {
                Ok(bytes) => {
                    manifests.insert(environment.clone(), bytes);
                }
                Err(err) => {
                    errors.insert(environment.clone(), err.to_string());
                }
            }
        }
        Ok(Self {
            config,
            environments,
            manifests,
            errors,
        })
    }
}

/// Kustomize application; ArgoCD renders it from the source repo.
pub struct KustomizeApp {
    pub config: AppConfig,
}

/// Plain-directory application; the extra glob fields feed the
/// directory-source generator.
pub struct DirectoryApp {
    pub config: AppDirConfig,
}

pub enum AppVariant {
    HelmMultiEnv(HelmMultiEnvApp),
    Kustomize(KustomizeApp),
    Directory(DirectoryApp),
}

impl AppVariant {
    pub fn config(&self) -> &AppConfig {
        match self {
            AppVariant::HelmMultiEnv(app) => &app.config,
            AppVariant::Kustomize(app) => &app.config,
            AppVariant::Directory(app) => &app.config.config,
        }
    }

    /// Pre-rendered manifests keyed by environment; empty for variants
    /// that defer rendering to ArgoCD.
    pub fn manifests(&self) -> &BTreeMap<String, Vec<u8>> {
        match self {
            AppVariant::HelmMultiEnv(app) => &app.manifests,
            _ => &EMPTY_MANIFESTS,
        }
    }

    /// Per-environment render failures recorded by the multi-environment
    /// variant.
    pub fn render_errors(&self) -> &BTreeMap<String, String> {
        match self {
            AppVariant::HelmMultiEnv(app) => &app.errors,
            _ => &EMPTY_ERRORS,
        }
    }

    pub fn descriptor_file(&self) -> &'static str {
        match self {
            AppVariant::Directory(_) => CONFIG_DIR_FILE,
            _ => CONFIG_FILE,
        }
    }

    fn descriptor_bytes(&self) -> Result<Vec<u8>, WriterError> {
        let mut bytes = match self {
            AppVariant::Directory(app) => serde_json::to_vec_pretty(&app.config)?,
            other => serde_json::to_vec_pretty(other.config())?,
        };
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Writes the descriptor and any pre-rendered manifests for one
    /// (app, project) pair onto an apps-scoped view. Fails if the pair's
    /// directory already exists.
    pub fn create_files(
        &self,
        layout: &Layout,
        app_layout: AppLayout,
        apps_fs: &RepoFs,
        project: &str,
    ) -> Result<(), WriterError> {
        let app = self.config().user_given_name.clone();
        let dir = layout.project_subdir(&app, project, app_layout);
        if apps_fs.exists(&dir) {
            return Err(WriterError::AppAlreadyInstalled {
                name: app,
                project: project.to_string(),
            });
        }
        apps_fs.write(dir.join(self.descriptor_file()), self.descriptor_bytes()?)?;
        for (environment, manifest) in self.manifests() {
            let file = dir.join(MANIFEST_DIR).join(format!("{}.yaml", environment));
            apps_fs.write(file, manifest)?;
        }
        Ok(())
    }
}
