//! Process-wide clone cache.
//!
//! Read views are shared: the first read of a remote clones it, later reads
//! refresh that clone and hand out a new view over the same work tree.
//! Write views are never cached — every write intent gets a fresh, private
//! clone — so the cache key reduces to the remote URL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::RepoError;
use crate::git::GitRepository;
use crate::reference::{CloneMode, RepoRef};
use crate::view::RepoFs;
use crate::{RepoHandle, RepoOpener};

/// Injected cache of read clones; lives as long as the process that owns it.
#[derive(Default)]
pub struct RepoCache {
    entries: Mutex<HashMap<String, Arc<GitRepository>>>,
}

impl RepoCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, url: &str) -> Option<Arc<GitRepository>> {
        match self.entries.lock() {
            Ok(guard) => guard.get(url).cloned(),
            Err(poisoned) => poisoned.into_inner().get(url).cloned(),
        }
    }

    fn insert(&self, url: String, repo: Arc<GitRepository>) {
        match self.entries.lock() {
            Ok(mut guard) => {
                guard.insert(url, repo);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(url, repo);
            }
        }
    }

    fn handle(reference: &RepoRef, repo: Arc<GitRepository>) -> RepoHandle {
        let mut fs = RepoFs::new(repo.workdir());
        if let Some(sub) = &reference.subpath {
            fs = fs.scoped(sub);
        }
        RepoHandle { repo, fs }
    }
}

impl RepoOpener for RepoCache {
    fn open(&self, reference: &RepoRef) -> Result<RepoHandle, RepoError> {
        match reference.mode {
            CloneMode::Write => {
                let repo = Arc::new(GitRepository::clone(reference)?);
                Ok(Self::handle(reference, repo))
            }
            CloneMode::Read => {
                if let Some(cached) = self.get(&reference.url) {
                    tracing::debug!(url = %reference.url, "cache hit");
                    cached.refresh()?;
                    return Ok(Self::handle(reference, cached));
                }
                let repo = Arc::new(GitRepository::clone(reference)?);
                self.insert(reference.url.clone(), Arc::clone(&repo));
                Ok(Self::handle(reference, repo))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
