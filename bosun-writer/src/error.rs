use bosun_manifest::ManifestError;
use bosun_repo::RepoError;
use thiserror::Error;

/// Coarse classification used by callers that map failures onto exit codes
/// or response statuses without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed.
    Validation,
    /// The named resource does not exist.
    NotFound,
    /// The resource already exists or would be overwritten.
    Conflict,
    /// The repository is not in a state that allows the operation.
    Precondition,
    /// The underlying repository, manifest, or registrar machinery failed.
    Backend,
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("application specifier is required")]
    EmptyAppSpecifier,

    #[error("project name is required")]
    EmptyProjectName,

    #[error("only the vault provider is supported")]
    UnsupportedProvider,

    #[error("secret store ids are assigned on creation and must not be supplied")]
    ClientSuppliedId,

    #[error("project '{name}' already exists")]
    ProjectExists { name: String },

    #[error("application '{name}' is already installed in project '{project}'")]
    AppAlreadyInstalled { name: String, project: String },

    #[error("secret store '{id}' already exists")]
    StoreExists { id: String },

    #[error("repository is already bootstrapped at '{path}'")]
    AlreadyBootstrapped { path: String },

    #[error("project '{name}' not found")]
    ProjectNotFound { name: String },

    #[error("application '{name}' not found")]
    AppNotFound { name: String },

    #[error("application '{name}' is not installed in project '{project}'")]
    AppNotInProject { name: String, project: String },

    #[error("secret store '{id}' not found")]
    StoreNotFound { id: String },

    #[error("no bootstrap found under '{path}', run `bosun repo bootstrap` first")]
    NotBootstrapped { path: String },

    #[error("install mode '{mode}' is not supported for multi-environment sources")]
    UnsupportedInstallMode { mode: String },

    #[error("at least one environment is required for a multi-environment application")]
    NoEnvironments,

    #[error("attaching cluster context '{context}' requires a cluster registrar")]
    RegistrarRequired { context: String },

    #[error("updating applications in place is not supported")]
    UpdateUnsupported,

    #[error("registering cluster context '{context}' failed")]
    ClusterRegistration {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("rendering application source failed")]
    Source {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("descriptor is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl WriterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WriterError::EmptyAppSpecifier
            | WriterError::EmptyProjectName
            | WriterError::UnsupportedProvider
            | WriterError::ClientSuppliedId => ErrorKind::Validation,
            WriterError::ProjectExists { .. }
            | WriterError::AppAlreadyInstalled { .. }
            | WriterError::StoreExists { .. }
            | WriterError::AlreadyBootstrapped { .. } => ErrorKind::Conflict,
            WriterError::ProjectNotFound { .. }
            | WriterError::AppNotFound { .. }
            | WriterError::AppNotInProject { .. }
            | WriterError::StoreNotFound { .. } => ErrorKind::NotFound,
            WriterError::NotBootstrapped { .. }
            | WriterError::UnsupportedInstallMode { .. }
            | WriterError::NoEnvironments
            | WriterError::RegistrarRequired { .. }
            | WriterError::UpdateUnsupported => ErrorKind::Precondition,
            WriterError::ClusterRegistration { .. }
            | WriterError::Source { .. }
            | WriterError::Repo(_)
            | WriterError::Manifest(_)
            | WriterError::Json(_)
            | WriterError::Yaml(_) => ErrorKind::Backend,
        }
    }
}
