//! git2-backed repository access.
//!
//! Each [`GitRepository`] owns an on-disk clone in a temporary directory
//! that lives exactly as long as the handle. Persisting stages the whole
//! work tree, commits, and pushes the tracked branch; an up-to-date tree
//! pushes no new commit, which is what makes retried operations idempotent
//! at the content level.

use std::path::PathBuf;
use std::sync::Mutex;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{Commit, Cred, FetchOptions, IndexAddOption, PushOptions, RemoteCallbacks, ResetType};
use tempfile::TempDir;

use crate::error::{io_err, RepoError};
use crate::reference::{RepoAuth, RepoRef};
use crate::Repository;

// ---------------------------------------------------------------------------
// GitRepository
// ---------------------------------------------------------------------------

/// A clone of one remote. Interior access is serialized because libgit2
/// handles are not thread-safe; the work tree path itself is stable and can
/// back concurrently shared read views.
pub struct GitRepository {
    inner: Mutex<git2::Repository>,
    workdir: PathBuf,
    url: String,
    /// Branch tracked by this clone; `None` when pinned to a tag/commit.
    branch: Option<String>,
    auth: Option<RepoAuth>,
    _tmp: TempDir,
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("url", &self.url)
            .field("workdir", &self.workdir)
            .field("branch", &self.branch)
            .finish()
    }
}

impl GitRepository {
    /// Clone `reference` into a fresh temporary directory and check out its
    /// revision (remote default branch when unset).
    pub fn clone(reference: &RepoRef) -> Result<Self, RepoError> {
        let tmp = TempDir::new().map_err(|e| io_err(std::env::temp_dir(), e))?;

        tracing::debug!(url = %reference.url, "cloning");
        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_options(reference.auth.as_ref()));
        let repo = builder.clone(&reference.url, tmp.path())?;

        if let Some(rev) = &reference.revision {
            checkout_revision(&repo, rev)?;
        }
        let branch = current_branch(&repo);

        Ok(Self {
            workdir: tmp.path().to_path_buf(),
            url: reference.url.clone(),
            branch,
            auth: reference.auth.clone(),
            inner: Mutex::new(repo),
            _tmp: tmp,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn workdir(&self) -> &PathBuf {
        &self.workdir
    }

    /// Fetch the tracked branch and hard-reset the work tree to the remote
    /// head, so a cached view observes pushes made after it was cloned.
    /// A pinned view never moves, so refresh is a no-op for it.
    pub fn refresh(&self) -> Result<(), RepoError> {
        let Some(branch) = &self.branch else {
            return Ok(());
        };
        let repo = lock(&self.inner);

        let mut remote = repo.find_remote("origin")?;
        let mut opts = fetch_options(self.auth.as_ref());
        remote.fetch(&[branch.as_str()], Some(&mut opts), None)?;

        let head = repo.revparse_single(&format!("refs/remotes/origin/{branch}"))?;
        repo.reset(&head, ResetType::Hard, None)?;
        tracing::debug!(url = %self.url, branch = %branch, "refreshed");
        Ok(())
    }
}

impl Repository for GitRepository {
    fn persist(&self, message: &str) -> Result<String, RepoError> {
        let Some(branch) = &self.branch else {
            return Err(RepoError::DetachedHead {
                url: self.url.clone(),
            });
        };
        let repo = lock(&self.inner);

        let mut index = repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            // Unborn branch: first commit of an empty remote.
            Err(_) => None,
        };

        let commit_id = match &parent {
            Some(parent) if parent.tree_id() == tree_id => {
                tracing::debug!(url = %self.url, "work tree unchanged, pushing current head");
                parent.id()
            }
            _ => {
                let sig = repo
                    .signature()
                    .or_else(|_| git2::Signature::now("bosun", "bosun@localhost"))?;
                let parents: Vec<&Commit> = parent.iter().collect();
                repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?
            }
        };

        let mut remote = repo.find_remote("origin")?;
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        let mut opts = PushOptions::new();
        opts.remote_callbacks(callbacks(self.auth.as_ref()));
        remote.push(&[refspec.as_str()], Some(&mut opts))?;

        tracing::info!(url = %self.url, revision = %commit_id, "pushed: {message}");
        Ok(commit_id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Poisoned-lock recovery: a panic mid-operation leaves the clone in an
/// unknown state, but the clone is private and disposable, so continuing is
/// safe.
fn lock(inner: &Mutex<git2::Repository>) -> std::sync::MutexGuard<'_, git2::Repository> {
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn callbacks(auth: Option<&RepoAuth>) -> RemoteCallbacks<'static> {
    let mut cb = RemoteCallbacks::new();
    if let Some(auth) = auth {
        let auth = auth.clone();
        cb.credentials(move |_url, username_from_url, _allowed| {
            let user = auth
                .username
                .as_deref()
                .or(username_from_url)
                .unwrap_or("git");
            Cred::userpass_plaintext(user, &auth.token)
        });
    }
    cb
}

fn fetch_options(auth: Option<&RepoAuth>) -> FetchOptions<'static> {
    let mut opts = FetchOptions::new();
    opts.remote_callbacks(callbacks(auth));
    opts
}

/// Check out a named revision: a remote branch becomes a tracking local
/// branch; anything else (tag, commit id) pins the view detached.
fn checkout_revision(repo: &git2::Repository, rev: &str) -> Result<(), RepoError> {
    let remote_ref = format!("refs/remotes/origin/{rev}");
    match repo.find_reference(&remote_ref) {
        Ok(reference) => {
            let commit = reference.peel_to_commit()?;
            repo.branch(rev, &commit, true)?;
            repo.set_head(&format!("refs/heads/{rev}"))?;
        }
        Err(_) => {
            let obj = repo.revparse_single(rev)?;
            repo.set_head_detached(obj.id())?;
        }
    }
    repo.checkout_head(Some(CheckoutBuilder::new().force()))?;
    Ok(())
}

/// The branch HEAD tracks, including the unborn-branch case of a freshly
/// cloned empty remote. `None` means detached.
fn current_branch(repo: &git2::Repository) -> Option<String> {
    match repo.head() {
        Ok(head) if head.is_branch() => head.shorthand().map(str::to_owned),
        Ok(_) => None,
        Err(_) => repo
            .find_reference("HEAD")
            .ok()
            .and_then(|r| r.symbolic_target().map(str::to_owned))
            .map(|target| target.trim_start_matches("refs/heads/").to_owned()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use git2::RepositoryInitOptions;
    use tempfile::TempDir;

    use super::*;
    use crate::reference::CloneMode;
    use crate::view::RepoFs;

    /// A bare remote seeded with an initial commit on `main`.
    fn seed_remote(files: &[(&str, &str)]) -> (TempDir, String) {
        let root = TempDir::new().unwrap();
        let bare_path = root.path().join("remote.git");
        let mut opts = RepositoryInitOptions::new();
        opts.bare(true).initial_head("main");
        git2::Repository::init_opts(&bare_path, &opts).unwrap();

        let work_path = root.path().join("seed");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let work = git2::Repository::init_opts(&work_path, &opts).unwrap();

        for (rel, content) in files {
            let path = work_path.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        let mut index = work.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = work.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("seed", "seed@test").unwrap();
        work.commit(Some("HEAD"), &sig, &sig, "seed", &tree, &[])
            .unwrap();

        let url = bare_path.to_string_lossy().into_owned();
        let mut remote = work.remote("origin", &url).unwrap();
        remote
            .push(&["refs/heads/main:refs/heads/main"], None)
            .unwrap();

        (root, url)
    }

    fn bare_remote_commit_count(url: &str) -> usize {
        let repo = git2::Repository::open(url).unwrap();
        let mut walk = repo.revwalk().unwrap();
        walk.push_head().unwrap();
        walk.count()
    }

    #[test]
    fn clone_exposes_seeded_files() {
        let (_root, url) = seed_remote(&[("README.md", "hello"), ("apps/a/config.json", "{}")]);
        let repo = GitRepository::clone(&RepoRef::new(&url)).unwrap();
        let fs = RepoFs::new(repo.workdir());
        assert_eq!(fs.read_to_string("README.md").unwrap(), "hello");
        assert!(fs.exists("apps/a/config.json"));
    }

    #[test]
    fn persist_pushes_a_commit_to_the_remote() {
        let (_root, url) = seed_remote(&[("README.md", "hello")]);
        let repo = GitRepository::clone(&RepoRef::new(&url).for_write()).unwrap();
        let fs = RepoFs::new(repo.workdir());

        fs.write("projects/teama.yaml", "kind: AppProject").unwrap();
        let revision = repo.persist("chore: added project 'teama'").unwrap();
        assert_eq!(revision.len(), 40, "full commit id expected");
        assert_eq!(bare_remote_commit_count(&url), 2);
    }

    #[test]
    fn persist_with_unchanged_tree_pushes_no_new_commit() {
        let (_root, url) = seed_remote(&[("README.md", "hello")]);
        let repo = GitRepository::clone(&RepoRef::new(&url).for_write()).unwrap();
        let first = repo.persist("noop").unwrap();
        assert_eq!(bare_remote_commit_count(&url), 1);

        let second = repo.persist("noop again").unwrap();
        assert_eq!(first, second);
        assert_eq!(bare_remote_commit_count(&url), 1);
    }

    #[test]
    fn persist_records_deletions() {
        let (_root, url) = seed_remote(&[("apps/foo/config.json", "{}"), ("keep.md", "x")]);
        let repo = GitRepository::clone(&RepoRef::new(&url).for_write()).unwrap();
        let fs = RepoFs::new(repo.workdir());
        fs.remove_dir_all("apps/foo").unwrap();
        repo.persist("chore: delete app 'foo'").unwrap();

        let checker = GitRepository::clone(&RepoRef::new(&url)).unwrap();
        let fs = RepoFs::new(checker.workdir());
        assert!(!fs.exists("apps/foo"));
        assert!(fs.exists("keep.md"));
    }

    #[test]
    fn refresh_observes_a_push_from_another_clone() {
        let (_root, url) = seed_remote(&[("README.md", "v1")]);
        let reader = GitRepository::clone(&RepoRef::new(&url)).unwrap();

        let writer = GitRepository::clone(&RepoRef::new(&url).for_write()).unwrap();
        RepoFs::new(writer.workdir())
            .write("README.md", "v2")
            .unwrap();
        writer.persist("update readme").unwrap();

        let fs = RepoFs::new(reader.workdir());
        assert_eq!(fs.read_to_string("README.md").unwrap(), "v1");
        reader.refresh().unwrap();
        assert_eq!(fs.read_to_string("README.md").unwrap(), "v2");
    }

    #[test]
    fn persist_into_empty_remote_creates_the_branch() {
        let root = TempDir::new().unwrap();
        let bare_path = root.path().join("empty.git");
        let mut opts = RepositoryInitOptions::new();
        opts.bare(true).initial_head("main");
        git2::Repository::init_opts(&bare_path, &opts).unwrap();
        let url = bare_path.to_string_lossy().into_owned();

        let repo = GitRepository::clone(&RepoRef::new(&url).for_write()).unwrap();
        RepoFs::new(repo.workdir())
            .write("bootstrap/argo-cd/kustomization.yaml", "namespace: argocd\n")
            .unwrap();
        repo.persist("chore: bootstrap gitops repository").unwrap();
        assert_eq!(bare_remote_commit_count(&url), 1);
    }

    #[test]
    fn clone_mode_defaults_to_read() {
        let r = RepoRef::new("ignored");
        assert_eq!(r.mode, CloneMode::Read);
    }
}
