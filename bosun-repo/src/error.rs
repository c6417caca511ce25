//! Error types for bosun-repo.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from repository access.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Underlying libgit2 failure (clone, fetch, commit, push).
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A repository reference string that could not be parsed.
    #[error("invalid repository reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// A malformed glob pattern handed to a view.
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Persist was called on a view pinned to a tag or commit id; pushes
    /// need a branch to advance.
    #[error("cannot push '{url}': view is pinned to a revision, not a branch")]
    DetachedHead { url: String },
}

/// Convenience constructor for [`RepoError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RepoError {
    RepoError::Io {
        path: path.into(),
        source,
    }
}
