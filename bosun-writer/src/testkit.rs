//! In-memory repository doubles for operation tests. Views are plain
//! tempdir trees shared between read and write handles, so fixtures set
//! up through [`FakeOpener::seed_fs`] are visible to the operation under
//! test and persisted commits are observable as recorded messages.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use bosun_repo::{RepoError, RepoFs, RepoHandle, RepoOpener, RepoRef, Repository};
use tempfile::TempDir;

pub const META_URL: &str = "https://git.example.com/org/meta.git";
pub const TENANT_URL: &str = "https://git.example.com/org/tenant.git";

pub struct RecordingRepo {
    messages: Mutex<Vec<String>>,
}

impl RecordingRepo {
    fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }
}

impl Repository for RecordingRepo {
    fn persist(&self, message: &str) -> Result<String, RepoError> {
        let mut messages = self.messages.lock().unwrap();
        messages.push(message.to_string());
        Ok(format!("{:040x}", messages.len()))
    }
}

pub struct FakeOpener {
    root: TempDir,
    repos: Mutex<HashMap<String, Arc<RecordingRepo>>>,
}

impl FakeOpener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            root: TempDir::new().unwrap(),
            repos: Mutex::new(HashMap::new()),
        })
    }

    fn dir_for(&self, url: &str) -> PathBuf {
        let slug: String = url
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.root.path().join(slug)
    }

    /// A view over the named repository's tree for fixture setup and
    /// assertions, independent of any open handle.
    pub fn seed_fs(&self, url: &str) -> RepoFs {
        let dir = self.dir_for(url);
        std::fs::create_dir_all(&dir).unwrap();
        RepoFs::new(dir)
    }

    /// Commit messages persisted against the named repository, in order.
    pub fn persisted(&self, url: &str) -> Vec<String> {
        let repos = self.repos.lock().unwrap();
        repos
            .get(url)
            .map(|r| r.messages.lock().unwrap().clone())
            .unwrap_or_default()
    }

    fn repo_for(&self, url: &str) -> Arc<RecordingRepo> {
        let mut repos = self.repos.lock().unwrap();
        repos
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(RecordingRepo::new()))
            .clone()
    }
}

impl RepoOpener for FakeOpener {
    fn open(&self, reference: &RepoRef) -> Result<RepoHandle, RepoError> {
        let fs = self.seed_fs(&reference.url);
        let fs = match &reference.subpath {
            Some(sub) => fs.scoped(sub),
            None => fs,
        };
        Ok(RepoHandle {
            repo: self.repo_for(&reference.url),
            fs,
        })
    }
}

/// A meta view carrying the bootstrap marker operations require.
pub fn seed_bootstrap(fs: &RepoFs, namespace: &str) {
    fs.write(
        "bootstrap/argo-cd/kustomization.yaml",
        format!(
            "apiVersion: kustomize.config.k8s.io/v1beta1\nkind: Kustomization\nnamespace: {}\n",
            namespace
        ),
    )
    .unwrap();
}
