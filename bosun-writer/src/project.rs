//! Project (tenant) operations.
//!
//! A project is one YAML file under `projects/` holding its AppProject
//! and ApplicationSet pair. Creation regenerates the pair wholesale;
//! list and get parse it back; deletion detaches the project from every
//! application before removing the file, collapsing application
//! directories that would be left empty.

use std::collections::BTreeMap;

use bosun_core::keys;
use bosun_core::types::{ClusterConfig, ProjectName, TenantDetail, TenantSummary};
use bosun_manifest::{
    parse_project_file, render_cluster_readme, render_project_file, ProjectManifestOptions,
};
use bosun_repo::{BulkWrite, CloneMode, RepoFs};

use crate::error::WriterError;
use crate::RepoWriter;

// ---------------------------------------------------------------------------
// Cluster registrar
// ---------------------------------------------------------------------------

/// Resolves a kube context name to a reachable cluster endpoint and
/// registers it with the reconciler. Context resolution needs cluster
/// credentials the writer does not hold, so it stays behind a trait.
pub trait ClusterRegistrar {
    fn register(
        &self,
        context: &str,
    ) -> Result<ClusterEndpoint, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, Clone)]
pub struct ClusterEndpoint {
    pub name: String,
    pub server: String,
}

// ---------------------------------------------------------------------------
// Options and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ProjectCreateOptions {
    pub name: ProjectName,
    /// Kube context to attach as the project's default destination;
    /// the in-cluster server when unset.
    pub dest_kube_context: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub dry_run: bool,
}

#[derive(Debug)]
pub enum ProjectOutcome {
    Pushed { revision: String },
    Rendered { manifest: String },
}

fn create_message(name: &str) -> String {
    format!("chore: added project '{}'", name)
}

fn delete_message(name: &str) -> String {
    format!("chore: deleted project '{}'", name)
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl RepoWriter {
    /// Creates a project file and, when a kube context is attached, its
    /// cluster resource bundle. A dry run returns the rendered manifest
    /// without writing anything.
    pub fn create_project(
        &self,
        opts: &ProjectCreateOptions,
        registrar: Option<&dyn ClusterRegistrar>,
    ) -> Result<ProjectOutcome, WriterError> {
        let name = opts.name.0.as_str();
        if name.is_empty() {
            return Err(WriterError::EmptyProjectName);
        }

        let mode = if opts.dry_run {
            CloneMode::Read
        } else {
            CloneMode::Write
        };
        let meta = self.open_meta(mode)?;
        let project_file = self.layout.project_file(name);
        if meta.fs.exists(&project_file) {
            return Err(WriterError::ProjectExists {
                name: name.to_string(),
            });
        }
        let namespace = self.installation_namespace(&meta.fs)?;

        let mut dest_server = self.layout.default_server.clone();
        let mut attached: Option<ClusterEndpoint> = None;
        if let Some(context) = opts.dest_kube_context.as_deref().filter(|c| !c.is_empty()) {
            let registrar = registrar.ok_or_else(|| WriterError::RegistrarRequired {
                context: context.to_string(),
            })?;
            let endpoint =
                registrar
                    .register(context)
                    .map_err(|source| WriterError::ClusterRegistration {
                        context: context.to_string(),
                        source,
                    })?;
            dest_server = endpoint.server.clone();
            attached = Some(endpoint);
        }

        // Generators watch the repository descriptors are written to,
        // which is the meta repository itself in the shared layout.
        let descriptors = self.tenant_ref();
        let manifest_opts = ProjectManifestOptions {
            name: name.to_string(),
            namespace,
            default_dest_server: dest_server,
            repo_url: descriptors.url.clone(),
            revision: descriptors.revision.clone().unwrap_or_default(),
            install_path: descriptors.install_path().to_string(),
            labels: opts.labels.clone(),
            annotations: opts.annotations.clone(),
        };
        let manifest = render_project_file(&self.layout, &manifest_opts)?;

        if opts.dry_run {
            return Ok(ProjectOutcome::Rendered { manifest });
        }

        let mut writes = vec![BulkWrite::new(project_file, manifest)];
        if let Some(endpoint) = attached {
            let config = ClusterConfig {
                name: endpoint.name.clone(),
                server: endpoint.server.clone(),
            };
            let mut json = serde_json::to_vec_pretty(&config)?;
            json.push(b'\n');
            let first_attach = !meta.fs.exists(self.layout.cluster_context_dir(&endpoint.name));
            writes.push(BulkWrite::new(
                self.layout.cluster_config_file(&endpoint.name),
                json,
            ));
            if first_attach {
                let readme = render_cluster_readme(&endpoint.name, &endpoint.server)?;
                writes.push(BulkWrite::new(
                    self.layout.cluster_readme(&endpoint.name),
                    readme,
                ));
            }
        }

        meta.fs.bulk_write(&writes)?;
        let revision = meta.repo.persist(&create_message(name))?;
        tracing::info!(project = name, %revision, "created project");
        Ok(ProjectOutcome::Pushed { revision })
    }

    /// Deletes a project: detaches it from every application, collapsing
    /// application directories left without any other project, then
    /// removes the project file. One commit per repository touched.
    pub fn delete_project(&self, name: &ProjectName) -> Result<String, WriterError> {
        let name = name.0.as_str();
        let meta = self.open_meta(CloneMode::Write)?;
        self.require_project(&meta.fs, name)?;

        let message = delete_message(name);
        if self.shared_repo() {
            self.detach_everywhere(&meta.fs, name)?;
            meta.fs.remove_file(self.layout.project_file(name))?;
            let revision = meta.repo.persist(&message)?;
            tracing::info!(project = name, %revision, "deleted project");
            return Ok(revision);
        }

        let apps = self.open_apps(CloneMode::Write)?;
        let changed = self.detach_everywhere(&apps.fs, name)?;
        meta.fs.remove_file(self.layout.project_file(name))?;
        let revision = meta.repo.persist(&message)?;
        if changed {
            apps.repo.persist(&message)?;
        }
        tracing::info!(project = name, %revision, "deleted project");
        Ok(revision)
    }

    /// Removes one project from every application that carries it.
    fn detach_everywhere(&self, fs: &RepoFs, project: &str) -> Result<bool, WriterError> {
        let apps_dir = self.layout.apps_dir();
        if !fs.is_dir(&apps_dir) {
            return Ok(false);
        }
        let mut changed = false;
        for app in fs.read_dir(&apps_dir)? {
            if !fs.is_dir(self.layout.app_dir(&app)) {
                continue;
            }
            if self.detach_project_from_app(fs, &app, project)? {
                changed = true;
            }
        }
        Ok(changed)
    }

    pub fn list_projects(&self) -> Result<Vec<TenantSummary>, WriterError> {
        let meta = self.open_meta(CloneMode::Read)?;
        let mut projects = Vec::new();
        for path in meta.fs.glob(&self.layout.project_glob())? {
            let text = meta.fs.read_to_string(&path)?;
            let (app_project, appset) = parse_project_file(&text)?;
            projects.push(summary_from_pair(self, &app_project, &appset));
        }
        Ok(projects)
    }

    pub fn get_project(&self, name: &ProjectName) -> Result<TenantDetail, WriterError> {
        let name = name.0.as_str();
        let meta = self.open_meta(CloneMode::Read)?;
        let file = self.layout.project_file(name);
        if !meta.fs.exists(&file) {
            return Err(WriterError::ProjectNotFound {
                name: name.to_string(),
            });
        }
        let text = meta.fs.read_to_string(&file)?;
        let (app_project, appset) = parse_project_file(&text)?;
        Ok(TenantDetail {
            summary: summary_from_pair(self, &app_project, &appset),
            description: app_project.spec.description.clone(),
            source_repos: app_project.spec.source_repos.clone(),
            cluster_resource_whitelist: app_project.spec.cluster_resource_whitelist.clone(),
            namespace_resource_whitelist: app_project.spec.namespace_resource_whitelist.clone(),
        })
    }
}

fn summary_from_pair(
    writer: &RepoWriter,
    app_project: &bosun_manifest::AppProject,
    appset: &bosun_manifest::ApplicationSet,
) -> TenantSummary {
    let default_cluster = app_project
        .metadata
        .annotations
        .get(keys::ANNOTATION_DEFAULT_DEST_SERVER)
        .cloned()
        .unwrap_or_else(|| writer.layout().default_server.clone());
    let gitops_repo = appset
        .spec
        .generators
        .first()
        .map(|g| g.git.repo_url.clone())
        .unwrap_or_default();
    TenantSummary {
        name: ProjectName::from(app_project.metadata.name.clone()),
        namespace: app_project.metadata.namespace.clone().unwrap_or_default(),
        default_cluster,
        gitops_repo,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
