//! Application operations.
//!
//! Applications are directories under `apps/`, one per-project
//! subdirectory each, holding the descriptor the project's
//! ApplicationSet generators template from. Whether the subdirectory
//! nests under `overlays/` and which repository it is committed to both
//! follow from the meta/tenant repository-identity comparison.

use std::collections::BTreeMap;
use std::path::Path;

use bosun_core::keys;
use bosun_core::types::{
    AppConfig, AppDirConfig, AppInstantiation, AppName, Application, DeployTarget, InstallMode,
    ProjectName, RuntimeStatus, SourceKind, SourceRef,
};
use bosun_repo::{CloneMode, RepoFs, RepoRef};

use crate::error::WriterError;
use crate::source::AppSource;
use crate::variant::{
    AppVariant, DirectoryApp, HelmMultiEnvApp, KustomizeApp, CONFIG_DIR_FILE, CONFIG_FILE,
};
use crate::RepoWriter;

const DEFAULT_APP_NAME: &str = "default";
const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_ENVIRONMENT: &str = "default";

// ---------------------------------------------------------------------------
// Options and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AppCreateOptions {
    pub project: ProjectName,
    /// User-facing name; doubles as the directory name under `apps/`.
    /// `default` when omitted.
    pub app_name: AppName,
    /// Source specifier: `<url>[//<subpath>][?ref=<revision>]`.
    pub app_specifier: String,
    pub kind: SourceKind,
    pub install_mode: InstallMode,
    /// Environments for the multi-environment variant; detected from the
    /// source when empty.
    pub environments: Vec<String>,
    pub dest_namespace: String,
    pub dest_server: String,
    pub app_code: Option<String>,
    pub description: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    /// Directory-variant glob fields.
    pub exclude: String,
    pub include: String,
    pub dry_run: bool,
}

/// Validity of one environment's rendered manifest.
#[derive(Debug, Clone)]
pub struct EnvReport {
    pub environment: String,
    pub valid: bool,
    pub manifest: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct AppCreated {
    pub message: String,
    /// Pushed revision; absent for dry runs.
    pub revision: Option<String>,
    pub total: usize,
    pub environments: Vec<EnvReport>,
}

fn create_message(name: &str) -> String {
    format!("chore: create app '{}'", name)
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl RepoWriter {
    /// Creates an application in a project. A dry run renders one
    /// manifest per declared environment through the source collaborator
    /// and reports each environment's validity without touching the
    /// repositories; one environment failing must not block the rest.
    pub fn create_application(
        &self,
        opts: &AppCreateOptions,
        source: &dyn AppSource,
    ) -> Result<AppCreated, WriterError> {
        if opts.app_specifier.trim().is_empty() {
            return Err(WriterError::EmptyAppSpecifier);
        }
        let project = opts.project.0.as_str();
        if project.is_empty() {
            return Err(WriterError::EmptyProjectName);
        }

        let source_ref = RepoRef::parse(&opts.app_specifier)?;
        let name = if opts.app_name.0.is_empty() {
            DEFAULT_APP_NAME.to_string()
        } else {
            opts.app_name.0.clone()
        };

        let shared = self.shared_repo();
        let meta_mode = if shared && !opts.dry_run {
            CloneMode::Write
        } else {
            CloneMode::Read
        };
        let meta = self.open_meta(meta_mode)?;
        self.require_project(&meta.fs, project)?;

        if opts.dry_run {
            return Ok(self.render_report(opts, source));
        }

        let config = self.build_config(opts, &name, project, &source_ref);
        let variant = match opts.kind {
            SourceKind::Helm => {
                let environments = self.resolve_environments(opts, source)?;
                AppVariant::HelmMultiEnv(HelmMultiEnvApp::render(
                    config,
                    environments,
                    opts.install_mode,
                    source,
                )?)
            }
            SourceKind::Kustomize => AppVariant::Kustomize(KustomizeApp { config }),
            SourceKind::Directory => AppVariant::Directory(DirectoryApp {
                config: AppDirConfig {
                    config,
                    exclude: opts.exclude.clone(),
                    include: opts.include.clone(),
                },
            }),
        };

        let apps = if shared {
            meta.clone()
        } else {
            self.open_apps(CloneMode::Write)?
        };
        let apps_fs = apps.fs.scoped(self.layout.apps_dir());
        variant.create_files(&self.layout, self.app_layout(), &apps_fs, project)?;

        let revision = apps.repo.persist(&create_message(&name))?;
        tracing::info!(app = name.as_str(), project, %revision, "created application");

        let environments: Vec<EnvReport> = variant
            .manifests()
            .keys()
            .map(|environment| EnvReport {
                environment: environment.clone(),
                valid: true,
                manifest: None,
                error: None,
            })
            .chain(
                variant
                    .render_errors()
                    .iter()
                    .map(|(environment, error)| EnvReport {
                        environment: environment.clone(),
                        valid: false,
                        manifest: None,
                        error: Some(error.clone()),
                    }),
            )
            .collect();
        Ok(AppCreated {
            message: format!("application '{}' created", name),
            revision: Some(revision),
            total: environments.len(),
            environments,
        })
    }

    /// Per-environment render report for dry runs; best-effort, never
    /// all-or-nothing.
    fn render_report(&self, opts: &AppCreateOptions, source: &dyn AppSource) -> AppCreated {
        let environments = match self.try_environments(opts, source) {
            Ok(environments) => environments,
            Err(error) => {
                return AppCreated {
                    message: "dry run".to_string(),
                    revision: None,
                    total: 1,
                    environments: vec![EnvReport {
                        environment: DEFAULT_ENVIRONMENT.to_string(),
                        valid: false,
                        manifest: None,
                        error: Some(error),
                    }],
                }
            }
        };

        let reports: Vec<EnvReport> = environments
            .into_iter()
            .map(|environment| match source.manifest(&environment) {
                Ok(bytes) => EnvReport {
                    environment,
                    valid: true,
                    manifest: Some(String::from_utf8_lossy(&bytes).into_owned()),
                    error: None,
                },
                Err(err) => EnvReport {
                    environment,
                    valid: false,
                    manifest: None,
                    error: Some(err.to_string()),
                },
            })
            .collect();
        AppCreated {
            message: "dry run".to_string(),
            revision: None,
            total: reports.len(),
            environments: reports,
        }
    }

    fn try_environments(
        &self,
        opts: &AppCreateOptions,
        source: &dyn AppSource,
    ) -> Result<Vec<String>, String> {
        if !opts.environments.is_empty() {
            return Ok(opts.environments.clone());
        }
        let detected = source.detect_environments().map_err(|e| e.to_string())?;
        if detected.is_empty() {
            Ok(vec![DEFAULT_ENVIRONMENT.to_string()])
        } else {
            Ok(detected)
        }
    }

    fn resolve_environments(
        &self,
        opts: &AppCreateOptions,
        source: &dyn AppSource,
    ) -> Result<Vec<String>, WriterError> {
        if !opts.environments.is_empty() {
            return Ok(opts.environments.clone());
        }
        let detected = source
            .detect_environments()
            .map_err(|source| WriterError::Source { source })?;
        if detected.is_empty() {
            Ok(vec![DEFAULT_ENVIRONMENT.to_string()])
        } else {
            Ok(detected)
        }
    }

    fn build_config(
        &self,
        opts: &AppCreateOptions,
        name: &str,
        project: &str,
        source_ref: &RepoRef,
    ) -> AppConfig {
        let mut annotations = opts.annotations.clone();
        if let Some(code) = &opts.app_code {
            annotations.insert(keys::ANNOTATION_APP_CODE.to_string(), code.clone());
        }
        if let Some(description) = &opts.description {
            annotations.insert(keys::ANNOTATION_DESCRIPTION.to_string(), description.clone());
        }
        let src_path = match source_ref.install_path() {
            "" => ".".to_string(),
            path => path.to_string(),
        };
        AppConfig {
            app_name: format!("{}-{}", project, name),
            user_given_name: name.to_string(),
            dest_namespace: if opts.dest_namespace.is_empty() {
                DEFAULT_NAMESPACE.to_string()
            } else {
                opts.dest_namespace.clone()
            },
            dest_server: if opts.dest_server.is_empty() {
                self.layout.default_server.clone()
            } else {
                opts.dest_server.clone()
            },
            src_path,
            src_repo_url: source_ref.url.clone(),
            src_target_revision: source_ref.revision.clone().unwrap_or_default(),
            labels: opts.labels.clone(),
            annotations,
        }
    }

    /// Deletes an application, entirely or from one project. The
    /// project-scoped form applies the collapse rule: a project that is
    /// the last child takes the whole application directory with it.
    pub fn delete_application(
        &self,
        name: &AppName,
        project: Option<&ProjectName>,
    ) -> Result<String, WriterError> {
        let name = name.0.as_str();
        let handle = self.open_apps(CloneMode::Write)?;
        let app_dir = self.layout.app_dir(name);
        if name.is_empty() || !handle.fs.is_dir(&app_dir) {
            return Err(WriterError::AppNotFound {
                name: name.to_string(),
            });
        }

        let mut message = format!("chore: delete app '{}'", name);
        match project {
            None => handle.fs.remove_dir_all(&app_dir)?,
            Some(project) => {
                let project = project.0.as_str();
                let overlays = self.layout.overlays_dir(name);
                let container = if handle.fs.is_dir(&overlays) {
                    overlays
                } else {
                    app_dir.clone()
                };
                let children = handle.fs.read_dir(&container)?;
                if !children.iter().any(|c| c == project) {
                    return Err(WriterError::AppNotInProject {
                        name: name.to_string(),
                        project: project.to_string(),
                    });
                }
                if children.len() == 1 {
                    handle.fs.remove_dir_all(&app_dir)?;
                } else {
                    handle.fs.remove_dir_all(container.join(project))?;
                    message = format!("chore: delete app '{}' from project '{}'", name, project);
                }
            }
        }

        let revision = handle.repo.persist(&message)?;
        tracing::info!(app = name, %revision, "deleted application");
        Ok(revision)
    }

    /// Removes one project's subdirectory from an application if present,
    /// collapsing the application when the project was its last child.
    /// Reports whether anything changed; an uninstalled project is a
    /// no-op, not an error.
    pub(crate) fn detach_project_from_app(
        &self,
        fs: &RepoFs,
        app: &str,
        project: &str,
    ) -> Result<bool, WriterError> {
        let app_dir = self.layout.app_dir(app);
        let overlays = self.layout.overlays_dir(app);
        let container = if fs.is_dir(&overlays) {
            overlays
        } else {
            app_dir.clone()
        };
        if !fs.is_dir(&container) {
            return Ok(false);
        }
        let children = fs.read_dir(&container)?;
        if !children.iter().any(|c| c == project) {
            return Ok(false);
        }
        if children.len() == 1 {
            fs.remove_dir_all(&app_dir)?;
        } else {
            fs.remove_dir_all(container.join(project))?;
        }
        Ok(true)
    }

    pub fn list_applications(&self, project: &ProjectName) -> Result<Vec<Application>, WriterError> {
        let project = project.0.as_str();
        if project.is_empty() {
            return Err(WriterError::EmptyProjectName);
        }
        let handle = self.open_apps(CloneMode::Read)?;
        let mut applications = Vec::new();
        for dir in handle
            .fs
            .glob(&self.layout.project_dir_glob(project, self.app_layout()))?
        {
            if !handle.fs.is_dir(&dir) {
                continue;
            }
            match read_app_config(&handle.fs, &dir)? {
                Some(config) => applications.push(self.application_entity(config, project)),
                None => {
                    tracing::warn!(dir = %dir.display(), "pair directory without a descriptor");
                }
            }
        }
        Ok(applications)
    }

    pub fn get_application(
        &self,
        project: &ProjectName,
        name: &AppName,
    ) -> Result<Application, WriterError> {
        let project = project.0.as_str();
        let name = name.0.as_str();
        let handle = self.open_apps(CloneMode::Read)?;
        let dir = self
            .layout
            .app_project_dir(name, project, self.app_layout());
        if !handle.fs.is_dir(&dir) {
            return Err(WriterError::AppNotFound {
                name: name.to_string(),
            });
        }
        match read_app_config(&handle.fs, &dir)? {
            Some(config) => Ok(self.application_entity(config, project)),
            None => Err(WriterError::AppNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Declared for create/delete parity. In-place update has no
    /// implementation and callers must hear that, not a silent success.
    pub fn update_application(&self, _opts: &AppCreateOptions) -> Result<AppCreated, WriterError> {
        Err(WriterError::UpdateUnsupported)
    }

    fn application_entity(&self, config: AppConfig, project: &str) -> Application {
        let app_code = config.annotations.get(keys::ANNOTATION_APP_CODE).cloned();
        let description = config
            .annotations
            .get(keys::ANNOTATION_DESCRIPTION)
            .cloned();
        Application {
            name: AppName::from(config.user_given_name.as_str()),
            source: SourceRef {
                repo: config.src_repo_url,
                path: config.src_path,
                target_revision: config.src_target_revision,
            },
            instantiation: AppInstantiation {
                user_given_name: config.user_given_name,
                tenant_name: project.to_string(),
                app_code,
                description,
            },
            targets: vec![DeployTarget {
                cluster: self.layout.default_context.clone(),
                namespace: config.dest_namespace,
            }],
            runtime: RuntimeStatus::default(),
        }
    }
}

/// Reads a pair directory's descriptor, whichever of the two forms is
/// present.
fn read_app_config(fs: &RepoFs, dir: &Path) -> Result<Option<AppConfig>, WriterError> {
    let single = dir.join(CONFIG_FILE);
    if fs.exists(&single) {
        return Ok(Some(serde_json::from_slice(&fs.read(&single)?)?));
    }
    let directory = dir.join(CONFIG_DIR_FILE);
    if fs.exists(&directory) {
        let config: AppDirConfig = serde_json::from_slice(&fs.read(&directory)?)?;
        return Ok(Some(config.config));
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
