//! bosun — gitops repository control plane CLI.
//!
//! # Usage
//!
//! ```text
//! bosun repo bootstrap [--namespace <ns>] [--dry-run]
//! bosun project create <name> [--dest-kube-context <ctx>] [--label k=v] [--dry-run]
//! bosun project delete <name>
//! bosun project list [--json]
//! bosun project get <name> [--json]
//! bosun app create <name> --app <url[//path][?ref=rev]> --project <p> [--type helm|kustomize|directory] [--dry-run]
//! bosun app delete <name> [--project <p>]
//! bosun app list --project <p> [--json]
//! bosun app get <name> --project <p> [--json]
//! bosun store create -f <file.yaml>
//! bosun store update <id> [--name <n>] [--server <url>] [--path <p>] [--auth-file <f>]
//! bosun store delete <id>
//! bosun store list [--json]
//! bosun store get <id> [--json]
//! ```

mod commands;
mod settings;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bosun_core::types::{InstallMode, SourceKind};
use commands::{
    app::AppCommand, project::ProjectCommand, repo::RepoCommand, store::StoreCommand,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "bosun",
    version,
    about = "Manage projects, applications and secret stores in a gitops repository",
    long_about = None,
)]
struct Cli {
    /// Config file; when omitted BOSUN_CONFIG, ./bosun.yaml and
    /// ~/.bosun/config.yaml are tried in that order.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bootstrap the gitops repository skeleton.
    Repo {
        #[command(subcommand)]
        command: RepoCommand,
    },

    /// Manage projects (tenants) and their generated manifests.
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Manage applications installed into projects.
    App {
        #[command(subcommand)]
        command: AppCommand,
    },

    /// Manage Vault secret stores in the cluster-resources bundle.
    Store {
        #[command(subcommand)]
        command: StoreCommand,
    },
}

// ---------------------------------------------------------------------------
// Shared argument wrappers — parsed from CLI strings, convert to core types
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `SourceKind` from CLI args.
#[derive(Debug, Clone, Default)]
pub struct SourceKindArg(pub SourceKind);

impl FromStr for SourceKindArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "helm" => Ok(Self(SourceKind::Helm)),
            "kustomize" => Ok(Self(SourceKind::Kustomize)),
            "directory" => Ok(Self(SourceKind::Directory)),
            other => Err(format!(
                "unknown app type '{other}'; expected: helm, kustomize, directory"
            )),
        }
    }
}

impl fmt::Display for SourceKindArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<SourceKindArg> for SourceKind {
    fn from(k: SourceKindArg) -> Self {
        k.0
    }
}

/// Thin wrapper so clap can parse `InstallMode` from CLI args.
#[derive(Debug, Clone, Default)]
pub struct InstallModeArg(pub InstallMode);

impl FromStr for InstallModeArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flatten" => Ok(Self(InstallMode::Flatten)),
            "nested" => Ok(Self(InstallMode::Nested)),
            other => Err(format!(
                "unknown install mode '{other}'; expected: flatten, nested"
            )),
        }
    }
}

impl fmt::Display for InstallModeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<InstallModeArg> for InstallMode {
    fn from(m: InstallModeArg) -> Self {
        m.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = settings::Settings::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Repo { command } => commands::repo::run(command, &settings),
        Commands::Project { command } => commands::project::run(command, &settings),
        Commands::App { command } => commands::app::run(command, &settings),
        Commands::Store { command } => commands::store::run(command, &settings),
    }
}
