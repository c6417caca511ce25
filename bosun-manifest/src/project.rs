//! Project manifest generation: the AppProject + ApplicationSet pair and
//! the cluster-resource bundle files.
//!
//! One project file drives dynamic discovery for every application installed
//! under it: the ApplicationSet carries exactly two git-file generators, one
//! watching `config.json` descriptors (single-manifest applications) and one
//! watching `config_dir.json` descriptors with a directory-source template.

use std::collections::BTreeMap;

use tera::{Context, Tera};

use bosun_core::{keys, Layout, ResourceKind};

use crate::argocd::{
    join_manifests, AppProject, AppProjectSpec, AppSetSpec, AppSetSyncPolicy, AppSpec, AppTemplate,
    ApplicationSet, AutomatedSync, DestinationSpec, DirectorySpec, Generator, GitFileItem,
    GitGenerator, IgnoreDifference, Metadata, ProjectDestination, SourceSpec, SyncPolicy,
    API_VERSION_ARGOPROJ, KIND_APPLICATION_SET, KIND_APP_PROJECT,
};
use crate::error::ManifestError;

/// Requeue interval for both git-file generators.
pub const DEFAULT_REQUEUE_SECONDS: u64 = 20;

const CLUSTER_README: &str = include_str!("../templates/cluster_readme.md");

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Everything project-manifest generation needs, resolved by the caller.
#[derive(Debug, Clone)]
pub struct ProjectManifestOptions {
    pub name: String,
    /// Installation namespace resolved from the bootstrap marker.
    pub namespace: String,
    pub default_dest_server: String,
    /// Remote the git-file generators watch.
    pub repo_url: String,
    pub revision: String,
    /// Repo-root-relative prefix of the installation (empty at root).
    pub install_path: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

fn default_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (keys::LABEL_MANAGED_BY.to_owned(), keys::MANAGED_BY.to_owned()),
        (keys::LABEL_NAME.to_owned(), name.to_owned()),
    ])
}

fn wildcard_whitelist() -> Vec<ResourceKind> {
    vec![ResourceKind {
        group: "*".to_owned(),
        kind: "*".to_owned(),
    }]
}

/// The AppProject half: wildcard source/destination whitelists — tenants are
/// isolated by name and namespace, not by restricting repositories.
pub fn generate_app_project(opts: &ProjectManifestOptions) -> AppProject {
    let mut annotations = opts.annotations.clone();
    annotations.insert(keys::ANNOTATION_SYNC_WAVE.to_owned(), "-2".to_owned());
    annotations.insert(
        keys::ANNOTATION_SYNC_OPTIONS.to_owned(),
        "PruneLast=true".to_owned(),
    );
    annotations.insert(
        keys::ANNOTATION_DEFAULT_DEST_SERVER.to_owned(),
        opts.default_dest_server.clone(),
    );

    let mut labels = default_labels(&opts.name);
    labels.extend(opts.labels.clone());

    AppProject {
        api_version: API_VERSION_ARGOPROJ.to_owned(),
        kind: KIND_APP_PROJECT.to_owned(),
        metadata: Metadata {
            name: opts.name.clone(),
            namespace: Some(opts.namespace.clone()),
            labels,
            annotations,
        },
        spec: AppProjectSpec {
            source_repos: vec!["*".to_owned()],
            destinations: vec![ProjectDestination {
                server: "*".to_owned(),
                namespace: "*".to_owned(),
            }],
            description: format!("{} project", opts.name),
            cluster_resource_whitelist: wildcard_whitelist(),
            namespace_resource_whitelist: wildcard_whitelist(),
        },
    }
}

fn template_source() -> SourceSpec {
    SourceSpec {
        repo_url: "{{ srcRepoURL }}".to_owned(),
        path: "{{ srcPath }}".to_owned(),
        target_revision: "{{ srcTargetRevision }}".to_owned(),
        directory: None,
    }
}

fn app_template(opts: &ProjectManifestOptions) -> AppTemplate {
    AppTemplate {
        metadata: Metadata {
            name: format!("{}-{{{{ userGivenName }}}}", opts.name),
            labels: default_labels(&opts.name),
            ..Default::default()
        },
        spec: AppSpec {
            project: opts.name.clone(),
            source: Some(template_source()),
            destination: Some(DestinationSpec {
                server: "{{ destServer }}".to_owned(),
                namespace: "{{ destNamespace }}".to_owned(),
            }),
            sync_policy: Some(SyncPolicy {
                automated: Some(AutomatedSync {
                    prune: true,
                    self_heal: true,
                    allow_empty: true,
                }),
            }),
            ignore_differences: vec![IgnoreDifference {
                group: "argoproj.io".to_owned(),
                kind: "Application".to_owned(),
                json_pointers: vec!["/status".to_owned()],
            }],
        },
    }
}

fn git_generator(opts: &ProjectManifestOptions, layout: &Layout, file: &str) -> GitGenerator {
    GitGenerator {
        repo_url: opts.repo_url.clone(),
        revision: opts.revision.clone(),
        files: vec![GitFileItem {
            path: layout.generator_glob(&opts.install_path, &opts.name, file),
        }],
        requeue_after_seconds: Some(DEFAULT_REQUEUE_SECONDS),
        template: None,
    }
}

/// The ApplicationSet half: two git-file generators, one per descriptor
/// flavor. The directory generator overrides the template source with a
/// recursive directory block.
pub fn generate_application_set(layout: &Layout, opts: &ProjectManifestOptions) -> ApplicationSet {
    let config_gen = git_generator(opts, layout, "config.json");

    let mut dir_gen = git_generator(opts, layout, "config_dir.json");
    dir_gen.template = Some(AppTemplate {
        metadata: Metadata::default(),
        spec: AppSpec {
            source: Some(SourceSpec {
                directory: Some(DirectorySpec {
                    recurse: true,
                    exclude: "{{ exclude }}".to_owned(),
                    include: "{{ include }}".to_owned(),
                }),
                ..template_source()
            }),
            ..Default::default()
        },
    });

    ApplicationSet {
        api_version: API_VERSION_ARGOPROJ.to_owned(),
        kind: KIND_APPLICATION_SET.to_owned(),
        metadata: Metadata {
            name: opts.name.clone(),
            namespace: Some(opts.namespace.clone()),
            labels: default_labels(&opts.name),
            annotations: BTreeMap::from([(
                keys::ANNOTATION_SYNC_WAVE.to_owned(),
                "0".to_owned(),
            )]),
        },
        spec: AppSetSpec {
            generators: vec![
                Generator { git: config_gen },
                Generator { git: dir_gen },
            ],
            template: app_template(opts),
            sync_policy: Some(AppSetSyncPolicy {
                preserve_resources_on_deletion: true,
            }),
        },
    }
}

/// The full project file: AppProject and ApplicationSet concatenated as one
/// multi-document manifest, committed as a single file.
pub fn render_project_file(
    layout: &Layout,
    opts: &ProjectManifestOptions,
) -> Result<String, ManifestError> {
    let project = serde_yaml::to_string(&generate_app_project(opts))?;
    let appset = serde_yaml::to_string(&generate_application_set(layout, opts))?;
    Ok(join_manifests(&[project, appset]))
}

// ---------------------------------------------------------------------------
// Cluster bundle
// ---------------------------------------------------------------------------

/// README dropped into a cluster-resource directory the first time the
/// context is attached.
pub fn render_cluster_readme(name: &str, server: &str) -> Result<String, ManifestError> {
    let mut ctx = Context::new();
    ctx.insert("name", name);
    ctx.insert("server", server);
    Ok(Tera::one_off(CLUSTER_README, &ctx, false)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
