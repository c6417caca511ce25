//! bosun repository access — references, rooted views, clone cache, git2
//! backend.
//!
//! The writer consumes three seams defined here:
//! - [`RepoOpener`] — resolve a [`RepoRef`] into a live [`RepoHandle`]
//! - [`Repository`] — commit-and-push one logical repository
//! - [`RepoFs`] — rooted filesystem view over a clone's work tree
//!
//! [`RepoCache`] is the production opener: shared refreshed clones for
//! reads, fresh private clones for writes.

pub mod cache;
pub mod error;
pub mod git;
pub mod reference;
pub mod view;

use std::sync::Arc;

pub use cache::RepoCache;
pub use error::RepoError;
pub use git::GitRepository;
pub use reference::{CloneMode, RepoAuth, RepoRef};
pub use view::{BulkWrite, RepoFs};

/// One logical repository that can persist its staged state.
pub trait Repository: Send + Sync {
    /// Commit the entire work tree and push. Returns the pushed revision.
    /// A lost fast-forward race surfaces as an error; the caller retries the
    /// whole operation against a fresh view.
    fn persist(&self, message: &str) -> Result<String, RepoError>;
}

/// Resolves references into live handles; implemented by [`RepoCache`] in
/// production and by fixture openers in writer tests.
pub trait RepoOpener: Send + Sync {
    fn open(&self, reference: &RepoRef) -> Result<RepoHandle, RepoError>;
}

/// A live repository plus the filesystem view scoped to the reference's
/// subpath.
#[derive(Clone)]
pub struct RepoHandle {
    pub repo: Arc<dyn Repository>,
    pub fs: RepoFs,
}
