//! End-to-end command flows against a throwaway bare remote. Every
//! assertion inspects the remote through a fresh checkout, not the
//! command's working clones.

use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use git2::{IndexAddOption, RepositoryInitOptions};
use predicates::prelude::predicate;
use predicates::str::contains;
use tempfile::TempDir;

const SRC: &str = "https://github.com/acme/billing.git//deploy?ref=v1.2.0";

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

/// Fresh checkout of the remote's current state, assertable via assert_fs.
fn checkout(url: &str) -> assert_fs::TempDir {
    let dir = assert_fs::TempDir::new().unwrap();
    git2::Repository::clone(url, dir.path()).unwrap();
    dir
}

fn head_message(url: &str) -> String {
    let repo = git2::Repository::open(url).unwrap();
    let commit = repo.head().unwrap().peel_to_commit().unwrap();
    commit.message().unwrap_or_default().to_string()
}

/// A bosun invocation isolated from the developer's real config: scratch
/// HOME, scratch working directory, endpoints via environment only.
fn bosun_cmd(home: &Path, meta_url: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bosun"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("BOSUN_META_URL", meta_url)
        .env_remove("BOSUN_TENANT_URL")
        .env_remove("BOSUN_AUTH_TOKEN")
        .env_remove("BOSUN_CONFIG")
        .current_dir(home);
    cmd
}

fn bootstrap(home: &Path, url: &str) {
    bosun_cmd(home, url)
        .args(["repo", "bootstrap"])
        .assert()
        .success()
        .stdout(contains("✓ Bootstrapped"));
}

#[test]
fn bootstrap_and_project_lifecycle() {
    let home = TempDir::new().unwrap();
    let (_remote, url) = seed_remote(&[("README.md", "# gitops\n")]);

    bootstrap(home.path(), &url);
    let tree = checkout(&url);
    tree.child("bootstrap/argo-cd/kustomization.yaml")
        .assert(predicate::path::exists());
    tree.child("bootstrap/cluster-resources/in-cluster.json")
        .assert(predicate::path::exists());
    tree.child("projects/README.md")
        .assert(predicate::path::exists());

    bosun_cmd(home.path(), &url)
        .args(["project", "create", "teama"])
        .assert()
        .success()
        .stdout(contains("✓ Added project 'teama'"));
    assert_eq!(head_message(&url), "chore: added project 'teama'");
    checkout(&url)
        .child("projects/teama.yaml")
        .assert(predicate::path::exists());

    bosun_cmd(home.path(), &url)
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(contains("teama"));

    bosun_cmd(home.path(), &url)
        .args(["project", "get", "teama", "--json"])
        .assert()
        .success()
        .stdout(contains("\"name\": \"teama\""));

    bosun_cmd(home.path(), &url)
        .args(["project", "delete", "teama"])
        .assert()
        .success()
        .stdout(contains("✓ Deleted project 'teama'"));
    assert_eq!(head_message(&url), "chore: deleted project 'teama'");
    checkout(&url)
        .child("projects/teama.yaml")
        .assert(predicate::path::missing());
}

#[test]
fn project_create_dry_run_pushes_nothing() {
    let home = TempDir::new().unwrap();
    let (_remote, url) = seed_remote(&[("README.md", "# gitops\n")]);
    bootstrap(home.path(), &url);

    bosun_cmd(home.path(), &url)
        .args(["project", "create", "preview", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("[dry-run]"))
        .stdout(contains("AppProject"))
        .stdout(contains("ApplicationSet"));

    assert_eq!(head_message(&url), "chore: bootstrap gitops repository");
    checkout(&url)
        .child("projects/preview.yaml")
        .assert(predicate::path::missing());
}

#[test]
fn app_create_and_scoped_delete_collapse() {
    let home = TempDir::new().unwrap();
    let (_remote, url) = seed_remote(&[("README.md", "# gitops\n")]);
    bootstrap(home.path(), &url);

    for project in ["teama", "teamb"] {
        bosun_cmd(home.path(), &url)
            .args(["project", "create", project])
            .assert()
            .success();
        bosun_cmd(home.path(), &url)
            .args([
                "app", "create", "billing", "--app", SRC, "--project", project, "--type",
                "kustomize",
            ])
            .assert()
            .success()
            .stdout(contains("✓ Created app 'billing'"));
    }
    assert_eq!(head_message(&url), "chore: create app 'billing'");

    let tree = checkout(&url);
    tree.child("apps/billing/overlays/teama/config.json")
        .assert(predicate::path::exists());
    tree.child("apps/billing/overlays/teamb/config.json")
        .assert(predicate::path::exists());

    bosun_cmd(home.path(), &url)
        .args(["app", "list", "--project", "teama"])
        .assert()
        .success()
        .stdout(contains("billing"))
        .stdout(contains("https://github.com/acme/billing.git"));

    // Two overlays: the scoped delete removes only teama's.
    bosun_cmd(home.path(), &url)
        .args(["app", "delete", "billing", "--project", "teama"])
        .assert()
        .success()
        .stdout(contains("✓ Deleted app 'billing' from project 'teama'"));
    assert_eq!(
        head_message(&url),
        "chore: delete app 'billing' from project 'teama'"
    );
    let tree = checkout(&url);
    tree.child("apps/billing/overlays/teama")
        .assert(predicate::path::missing());
    tree.child("apps/billing/overlays/teamb/config.json")
        .assert(predicate::path::exists());

    // Last overlay: the whole application directory collapses.
    bosun_cmd(home.path(), &url)
        .args(["app", "delete", "billing", "--project", "teamb"])
        .assert()
        .success()
        .stdout(contains("✓ Deleted app 'billing'"));
    assert_eq!(head_message(&url), "chore: delete app 'billing'");
    checkout(&url)
        .child("apps/billing")
        .assert(predicate::path::missing());
}

#[test]
fn store_lifecycle_and_idempotent_delete() {
    let home = TempDir::new().unwrap();
    let (_remote, url) = seed_remote(&[("README.md", "# gitops\n")]);
    bootstrap(home.path(), &url);

    let manifest = assert_fs::TempDir::new().unwrap();
    let file = manifest.child("store.yaml");
    file.write_str(
        r#"apiVersion: external-secrets.io/v1beta1
kind: SecretStore
metadata:
  name: vault-main
spec:
  provider:
    vault:
      server: https://vault.example.com
      path: secret
      version: v2
"#,
    )
    .unwrap();

    bosun_cmd(home.path(), &url)
        .args(["store", "create", "-f"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(contains("✓ Added secret store 'vault-main'"));
    assert_eq!(head_message(&url), "chore: added secret store 'vault-main'");

    let list = bosun_cmd(home.path(), &url)
        .args(["store", "list", "--json"])
        .output()
        .unwrap();
    assert!(list.status.success());
    let stores: serde_json::Value = serde_json::from_slice(&list.stdout).unwrap();
    let id = stores[0]["metadata"]["annotations"]["bosun.dev/id"]
        .as_str()
        .unwrap()
        .to_string();

    checkout(&url)
        .child(format!(
            "bootstrap/cluster-resources/in-cluster/ss-{id}.yaml"
        ))
        .assert(predicate::path::exists());

    bosun_cmd(home.path(), &url)
        .args(["store", "delete", &id])
        .assert()
        .success()
        .stdout(contains("✓ Deleted secret store"));
    assert_eq!(
        head_message(&url),
        format!("chore: deleted secret store '{id}'")
    );

    bosun_cmd(home.path(), &url)
        .args(["store", "delete", &id])
        .assert()
        .success()
        .stdout(contains("nothing to delete"));
}

#[test]
fn config_file_supplies_endpoints_and_clusters() {
    let home = TempDir::new().unwrap();
    let (_remote, url) = seed_remote(&[("README.md", "# gitops\n")]);
    bootstrap(home.path(), &url);

    let dir = assert_fs::TempDir::new().unwrap();
    let config = dir.child("bosun.yaml");
    config
        .write_str(&format!(
            "meta:\n  url: {url}\nclusters:\n  prod: https://prod.example.com:6443\n"
        ))
        .unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bosun"));
    cmd.env("HOME", home.path())
        .env("USERPROFILE", home.path())
        .env_remove("BOSUN_META_URL")
        .env_remove("BOSUN_TENANT_URL")
        .env_remove("BOSUN_AUTH_TOKEN")
        .env_remove("BOSUN_CONFIG")
        .current_dir(home.path())
        .args(["project", "create", "edge", "--dest-kube-context", "prod"])
        .arg("--config")
        .arg(config.path());
    cmd.assert()
        .success()
        .stdout(contains("✓ Added project 'edge'"));

    let tree = checkout(&url);
    tree.child("bootstrap/cluster-resources/prod.json")
        .assert(predicate::path::exists());
    let rendered =
        std::fs::read_to_string(tree.path().join("projects/edge.yaml")).unwrap();
    assert!(
        rendered.contains("https://prod.example.com:6443"),
        "project manifest should carry the prod server: {rendered}"
    );
}

#[test]
fn missing_meta_url_fails_with_guidance() {
    let home = TempDir::new().unwrap();
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bosun"));
    cmd.env("HOME", home.path())
        .env("USERPROFILE", home.path())
        .env_remove("BOSUN_META_URL")
        .env_remove("BOSUN_TENANT_URL")
        .env_remove("BOSUN_CONFIG")
        .current_dir(home.path())
        .args(["project", "list"]);
    cmd.assert()
        .failure()
        .stderr(contains("BOSUN_META_URL"));
}
