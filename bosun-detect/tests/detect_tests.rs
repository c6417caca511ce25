//! Parameterised source-kind detection tests for `bosun-detect`.
//!
//! Each case gets an isolated `TempDir` — no shared state.

use std::fs;

use bosun_core::SourceKind;
use bosun_detect::{detect_environments, detect_source, Confidence, DetectError};
use rstest::rstest;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

fn make_dir() -> TempDir {
    TempDir::new().expect("tempdir")
}

fn write(dir: &TempDir, rel: &str, content: &str) {
    let path = dir.path().join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir fixture");
    fs::write(path, content).expect("write fixture");
}

// ---------------------------------------------------------------------------
// Helm
// ---------------------------------------------------------------------------

#[test]
fn chart_with_name_is_high_confidence_helm() {
    let dir = make_dir();
    write(&dir, "Chart.yaml", "apiVersion: v2\nname: billing\nversion: 1.0.0\n");
    let s = detect_source(dir.path()).expect("detect");
    assert_eq!(s.kind, SourceKind::Helm);
    assert_eq!(s.confidence, Confidence::High);
    assert!(s.environments.is_empty());
}

#[test]
fn unparseable_chart_is_medium_confidence_helm() {
    let dir = make_dir();
    write(&dir, "Chart.yaml", ": not yaml :\n\t-");
    let s = detect_source(dir.path()).expect("detect");
    assert_eq!(s.kind, SourceKind::Helm);
    assert_eq!(s.confidence, Confidence::Medium);
}

#[test]
fn helm_environments_are_sorted() {
    let dir = make_dir();
    write(&dir, "Chart.yaml", "apiVersion: v2\nname: billing\n");
    write(&dir, "environments/staging/values.yaml", "replicas: 1\n");
    write(&dir, "environments/dev/values.yaml", "replicas: 1\n");
    write(&dir, "environments/prod/values.yml", "replicas: 3\n");
    let s = detect_source(dir.path()).expect("detect");
    assert_eq!(s.environments, vec!["dev", "prod", "staging"]);
}

#[test]
fn environment_dirs_without_values_are_skipped() {
    let dir = make_dir();
    write(&dir, "Chart.yaml", "apiVersion: v2\nname: billing\n");
    write(&dir, "environments/dev/values.yaml", "x: 1\n");
    write(&dir, "environments/broken/README.md", "no values here\n");
    let envs = detect_environments(dir.path()).expect("envs");
    assert_eq!(envs, vec!["dev"]);
}

#[test]
fn helm_wins_over_kustomize() {
    let dir = make_dir();
    write(&dir, "Chart.yaml", "apiVersion: v2\nname: both\n");
    write(&dir, "kustomization.yaml", "resources: []\n");
    let s = detect_source(dir.path()).expect("detect");
    assert_eq!(s.kind, SourceKind::Helm);
}

// ---------------------------------------------------------------------------
// Kustomize
// ---------------------------------------------------------------------------

#[rstest]
#[case("kustomization.yaml")]
#[case("kustomization.yml")]
#[case("Kustomization")]
fn kustomization_markers(#[case] marker: &str) {
    let dir = make_dir();
    write(&dir, marker, "resources:\n  - deployment.yaml\n");
    let s = detect_source(dir.path()).expect("detect");
    assert_eq!(s.kind, SourceKind::Kustomize);
    assert_eq!(s.confidence, Confidence::High);
}

// ---------------------------------------------------------------------------
// Directory fallback
// ---------------------------------------------------------------------------

#[test]
fn plain_manifests_fall_back_to_directory() {
    let dir = make_dir();
    write(&dir, "deployment.yaml", "kind: Deployment\n");
    write(&dir, "service.yaml", "kind: Service\n");
    let s = detect_source(dir.path()).expect("detect");
    assert_eq!(s.kind, SourceKind::Directory);
    assert_eq!(s.confidence, Confidence::Medium);
}

#[test]
fn missing_path_is_an_error() {
    let dir = make_dir();
    let missing = dir.path().join("nope");
    let err = detect_source(&missing).expect_err("should fail");
    assert!(matches!(err, DetectError::NotADirectory { .. }));
}

#[test]
fn environments_without_tree_is_empty() {
    let dir = make_dir();
    write(&dir, "deployment.yaml", "kind: Deployment\n");
    let envs = detect_environments(dir.path()).expect("envs");
    assert!(envs.is_empty());
}
