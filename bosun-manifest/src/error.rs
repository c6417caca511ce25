//! Error types for bosun-manifest.

use thiserror::Error;

/// All errors that can arise from manifest generation and parsing.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Template rendering error (cluster README).
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    /// A multi-document project file without the expected document pair.
    #[error("project file is missing a {kind} document")]
    MissingDocument { kind: &'static str },
}
