//! CLI configuration — repository endpoints, credentials and the cluster map.
//!
//! A single YAML file, resolved from `--config`, then `BOSUN_CONFIG`, then
//! `./bosun.yaml`, then `~/.bosun/config.yaml`. `BOSUN_META_URL`,
//! `BOSUN_TENANT_URL` and `BOSUN_AUTH_TOKEN` override the file afterwards,
//! so CI jobs can run without one.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use bosun_repo::{RepoAuth, RepoCache, RepoRef};
use bosun_writer::{ClusterEndpoint, ClusterRegistrar, RepoWriter};

pub const CONFIG_ENV: &str = "BOSUN_CONFIG";
pub const CONFIG_FILE: &str = "bosun.yaml";
pub const CONFIG_HOME_DIR: &str = ".bosun";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// The meta repository holding project descriptors.
    #[serde(default)]
    pub meta: RepoSettings,

    /// Tenant repository for split layouts; unset means applications live
    /// alongside the projects in the meta repository.
    #[serde(default)]
    pub tenant: Option<RepoSettings>,

    /// Token used against both remotes.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Kube context name to API server URL, consulted when a project is
    /// created with `--dest-kube-context`.
    #[serde(default)]
    pub clusters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RepoSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub revision: Option<String>,
    /// Subdirectory of the repository the layout is rooted at.
    #[serde(default)]
    pub install_path: Option<String>,
}

/// Environment overrides, split out so they can be applied from a test
/// without touching the process environment.
#[derive(Debug, Default)]
pub struct EnvOverrides {
    pub meta_url: Option<String>,
    pub tenant_url: Option<String>,
    pub auth_token: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            meta_url: env::var("BOSUN_META_URL").ok(),
            tenant_url: env::var("BOSUN_TENANT_URL").ok(),
            auth_token: env::var("BOSUN_AUTH_TOKEN").ok(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Settings {
    /// Loads the config file (if any) and applies environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match resolve_file(explicit)? {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("cannot read config '{}'", path.display()))?;
                Self::from_yaml(&text)
                    .with_context(|| format!("invalid config '{}'", path.display()))?
            }
            None => Self::default(),
        };
        settings.apply(EnvOverrides::from_env());
        Ok(settings)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn apply(&mut self, overrides: EnvOverrides) {
        if let Some(url) = overrides.meta_url {
            self.meta.url = url;
        }
        match overrides.tenant_url {
            Some(url) if url.is_empty() => self.tenant = None,
            Some(url) => self.tenant.get_or_insert_with(RepoSettings::default).url = url,
            None => {}
        }
        if let Some(token) = overrides.auth_token {
            self.auth_token = Some(token);
        }
    }

    /// Builds the writer both repositories hang off. Each invocation gets a
    /// fresh clone cache; the process is one command long.
    pub fn writer(&self) -> Result<RepoWriter> {
        let meta = self.meta_ref()?;
        let mut writer = RepoWriter::new(Arc::new(RepoCache::new()), meta);
        if let Some(tenant) = self.tenant_ref() {
            writer = writer.with_tenant(tenant);
        }
        Ok(writer)
    }

    pub fn meta_ref(&self) -> Result<RepoRef> {
        if self.meta.url.is_empty() {
            bail!(
                "no meta repository configured — set meta.url in {} or BOSUN_META_URL",
                CONFIG_FILE
            );
        }
        Ok(self.repo_ref(&self.meta))
    }

    pub fn tenant_ref(&self) -> Option<RepoRef> {
        self.tenant
            .as_ref()
            .filter(|t| !t.url.is_empty())
            .map(|t| self.repo_ref(t))
    }

    fn repo_ref(&self, repo: &RepoSettings) -> RepoRef {
        let mut reference = RepoRef::new(repo.url.as_str());
        if let Some(revision) = repo.revision.as_deref() {
            reference = reference.with_revision(revision);
        }
        if let Some(path) = repo.install_path.as_deref() {
            reference = reference.with_subpath(path);
        }
        if let Some(token) = self.auth_token.as_deref() {
            reference = reference.with_auth(RepoAuth {
                username: None,
                token: token.to_string(),
            });
        }
        reference
    }
}

fn resolve_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("config file '{}' does not exist", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(path) = env::var_os(CONFIG_ENV) {
        let path = PathBuf::from(path);
        if !path.exists() {
            bail!("BOSUN_CONFIG points at '{}' which does not exist", path.display());
        }
        return Ok(Some(path));
    }
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return Ok(Some(local));
    }
    if let Some(home) = dirs::home_dir() {
        let fallback = home.join(CONFIG_HOME_DIR).join("config.yaml");
        if fallback.exists() {
            return Ok(Some(fallback));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Cluster registrar
// ---------------------------------------------------------------------------

/// Resolves kube contexts from the `clusters` map of the config file.
pub struct ConfigRegistrar {
    clusters: BTreeMap<String, String>,
}

impl ConfigRegistrar {
    pub fn new(clusters: BTreeMap<String, String>) -> Self {
        Self { clusters }
    }
}

impl ClusterRegistrar for ConfigRegistrar {
    fn register(
        &self,
        context: &str,
    ) -> std::result::Result<ClusterEndpoint, Box<dyn std::error::Error + Send + Sync>> {
        match self.clusters.get(context) {
            Some(server) => Ok(ClusterEndpoint {
                name: context.to_string(),
                server: server.clone(),
            }),
            None => Err(format!(
                "kube context '{context}' is not in the clusters map of the config file"
            )
            .into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
