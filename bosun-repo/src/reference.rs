//! Repository references.
//!
//! A reference names a remote plus the slice of it an operation works
//! against. The specifier form follows the kustomize remote convention:
//!
//! ```text
//! <url>[//<subpath>][?ref=<revision>]
//! https://github.com/org/infra.git//env/prod?ref=main
//! ```
//!
//! Two references point at *the same repository* iff their remote URLs are
//! equal; revision and subpath are views into one history and do not affect
//! identity. That equality decides the overlay-vs-flat application layout.

use std::fmt;

use crate::error::RepoError;

// ---------------------------------------------------------------------------
// Clone mode
// ---------------------------------------------------------------------------

/// Whether the caller intends to mutate the view. Read views may be served
/// from the shared cache; write views are always fresh, private clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloneMode {
    #[default]
    Read,
    Write,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Token credentials for a remote. The username defaults to the one embedded
/// in the URL, then to `git`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoAuth {
    pub username: Option<String>,
    pub token: String,
}

// ---------------------------------------------------------------------------
// RepoRef
// ---------------------------------------------------------------------------

/// A remote repository plus revision, subpath, credentials and clone intent.
#[derive(Debug, Clone)]
pub struct RepoRef {
    pub url: String,
    pub revision: Option<String>,
    pub subpath: Option<String>,
    pub auth: Option<RepoAuth>,
    pub mode: CloneMode,
}

impl RepoRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            revision: None,
            subpath: None,
            auth: None,
            mode: CloneMode::Read,
        }
    }

    /// Parse a kustomize-style specifier (`url[//subpath][?ref=revision]`).
    pub fn parse(raw: &str) -> Result<Self, RepoError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RepoError::InvalidReference {
                reference: raw.to_owned(),
                reason: "empty specifier".to_owned(),
            });
        }

        let (rest, revision) = match raw.split_once("?ref=") {
            Some((_, rev)) if rev.is_empty() => {
                return Err(RepoError::InvalidReference {
                    reference: raw.to_owned(),
                    reason: "empty ref".to_owned(),
                });
            }
            Some((rest, rev)) => (rest, Some(rev.to_owned())),
            None => (raw, None),
        };

        // The `//` separating url from subpath must not be the scheme's.
        let search_from = rest.find("://").map(|i| i + 3).unwrap_or(0);
        let (url, subpath) = match rest[search_from..].find("//") {
            Some(i) => {
                let split = search_from + i;
                let sub = rest[split + 2..].trim_matches('/');
                let sub = (!sub.is_empty()).then(|| sub.to_owned());
                (rest[..split].to_owned(), sub)
            }
            None => (rest.to_owned(), None),
        };

        if url.is_empty() {
            return Err(RepoError::InvalidReference {
                reference: raw.to_owned(),
                reason: "missing remote url".to_owned(),
            });
        }

        Ok(Self {
            url,
            revision,
            subpath,
            auth: None,
            mode: CloneMode::Read,
        })
    }

    /// Same remote, regardless of revision or subpath.
    pub fn same_repository(&self, other: &RepoRef) -> bool {
        self.url == other.url
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_subpath(mut self, subpath: impl Into<String>) -> Self {
        self.subpath = Some(subpath.into());
        self
    }

    pub fn with_auth(mut self, auth: RepoAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// The same reference with write intent.
    pub fn for_write(mut self) -> Self {
        self.mode = CloneMode::Write;
        self
    }

    /// The repo-root-relative prefix operations live under (empty at root).
    pub fn install_path(&self) -> &str {
        self.subpath.as_deref().unwrap_or("")
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)?;
        if let Some(sub) = &self.subpath {
            write!(f, "//{sub}")?;
        }
        if let Some(rev) = &self.revision {
            write!(f, "?ref={rev}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
