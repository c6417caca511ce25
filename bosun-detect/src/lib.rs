//! Source-kind detection for application checkouts.
//!
//! `detect_source(path)` inspects indicator files in an application source
//! directory and classifies it as helm, kustomize, or plain directory.
//! Checks are ordered by specificity: a chart definition wins over a
//! kustomization, and the directory kind is the fallback for anything that
//! is at least a directory.

use std::fs;
use std::path::{Path, PathBuf};

use bosun_core::SourceKind;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Confidence level of a detected source kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confidence {
    /// Definitive indicator file with a content match.
    High,
    /// Indicator present but content unreadable or unconvincing, or the
    /// directory fallback.
    Medium,
}

/// A classified application source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedSource {
    pub kind: SourceKind,
    pub confidence: Confidence,
    /// Declared environments, when the source carries an `environments/`
    /// tree (helm multi-environment layout). Empty otherwise.
    pub environments: Vec<String>,
}

/// Errors from source detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source path '{path}' is not a directory")]
    NotADirectory { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Classify the application source at `path`.
pub fn detect_source(path: &Path) -> Result<DetectedSource, DetectError> {
    if !path.is_dir() {
        return Err(DetectError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    if let Some(s) = detect_helm(path)? {
        return Ok(s);
    }
    if let Some(s) = detect_kustomize(path)? {
        return Ok(s);
    }

    Ok(DetectedSource {
        kind: SourceKind::Directory,
        confidence: Confidence::Medium,
        environments: Vec::new(),
    })
}

/// Environments declared under `<path>/environments/<env>/values.yaml`,
/// sorted. Empty when the tree is absent.
pub fn detect_environments(path: &Path) -> Result<Vec<String>, DetectError> {
    let env_root = path.join("environments");
    if !env_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut envs = Vec::new();
    for entry in fs::read_dir(&env_root)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let has_values = entry.path().join("values.yaml").exists()
            || entry.path().join("values.yml").exists();
        if has_values {
            envs.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    envs.sort();
    Ok(envs)
}

// ---------------------------------------------------------------------------
// Kind detectors
// ---------------------------------------------------------------------------

fn detect_helm(path: &Path) -> Result<Option<DetectedSource>, DetectError> {
    let chart = path.join("Chart.yaml");
    if !chart.exists() {
        return Ok(None);
    }

    // A parseable chart with a name is a definitive match.
    let confidence = match fs::read_to_string(&chart) {
        Ok(content) => match serde_yaml::from_str::<serde_yaml::Value>(&content) {
            Ok(doc) if doc.get("name").and_then(serde_yaml::Value::as_str).is_some() => {
                Confidence::High
            }
            _ => Confidence::Medium,
        },
        Err(_) => Confidence::Medium,
    };

    Ok(Some(DetectedSource {
        kind: SourceKind::Helm,
        confidence,
        environments: detect_environments(path)?,
    }))
}

fn detect_kustomize(path: &Path) -> Result<Option<DetectedSource>, DetectError> {
    let found = ["kustomization.yaml", "kustomization.yml", "Kustomization"]
        .iter()
        .any(|name| path.join(name).exists());
    if !found {
        return Ok(None);
    }

    Ok(Some(DetectedSource {
        kind: SourceKind::Kustomize,
        confidence: Confidence::High,
        environments: Vec::new(),
    }))
}
