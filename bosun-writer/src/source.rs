//! Application source rendering.
//!
//! Multi-environment creation and dry runs need the manifests an
//! application would produce per environment. Rendering is pluggable:
//! helm or other templating engines live behind [`AppSource`] so the
//! writer never shells out itself. [`RawManifestSource`] is the built-in
//! implementation for plain directories of YAML.

use std::fs;
use std::path::{Path, PathBuf};

use bosun_manifest::join_manifests;
use thiserror::Error;

/// Errors surfaced by a source renderer. Renderers are external
/// collaborators, so the writer treats their failures opaquely.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// A renderable application source checked out on the local filesystem.
pub trait AppSource: Send + Sync {
    /// Environments the source declares. An empty result means the source
    /// is single-environment; callers substitute `default`.
    fn detect_environments(&self) -> Result<Vec<String>, SourceError>;

    /// The full manifest stream for one environment.
    fn manifest(&self, environment: &str) -> Result<Vec<u8>, SourceError>;
}

#[derive(Debug, Error)]
enum RawSourceError {
    #[error("environment '{environment}' not found under '{root}'")]
    MissingEnvironment { environment: String, root: String },

    #[error("no manifest files under '{path}'")]
    NoManifests { path: String },
}

/// Source renderer for directories of plain Kubernetes YAML.
///
/// Environments map onto `environments/<name>/` subtrees when present;
/// otherwise the root itself serves the `default` environment. Rendering
/// is concatenation of the directory's top-level YAML files in name order.
pub struct RawManifestSource {
    root: PathBuf,
}

impl RawManifestSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn environment_dir(&self, environment: &str) -> Result<PathBuf, SourceError> {
        let scoped = self.root.join("environments").join(environment);
        if scoped.is_dir() {
            return Ok(scoped);
        }
        if environment == "default" {
            return Ok(self.root.clone());
        }
        Err(Box::new(RawSourceError::MissingEnvironment {
            environment: environment.to_string(),
            root: self.root.display().to_string(),
        }))
    }
}

impl AppSource for RawManifestSource {
    fn detect_environments(&self) -> Result<Vec<String>, SourceError> {
        let environments = bosun_detect::detect_environments(&self.root)?;
        Ok(environments)
    }

    fn manifest(&self, environment: &str) -> Result<Vec<u8>, SourceError> {
        let dir = self.environment_dir(environment)?;
        let mut documents = Vec::new();
        for name in yaml_files(&dir)? {
            let text = fs::read_to_string(dir.join(&name))?;
            documents.push(text);
        }
        if documents.is_empty() {
            return Err(Box::new(RawSourceError::NoManifests {
                path: dir.display().to_string(),
            }));
        }
        Ok(join_manifests(&documents).into_bytes())
    }
}

fn yaml_files(dir: &Path) -> Result<Vec<String>, std::io::Error> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".yaml") || name.ends_with(".yml") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
