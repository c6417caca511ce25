//! `bosun repo bootstrap` — seed a fresh gitops repository.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use bosun_writer::{BootstrapOptions, BootstrapOutcome};

use crate::settings::Settings;

use super::short_rev;

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// Write the reconciler marker, the in-cluster resource bundle and the
    /// top-level READMEs, then push.
    Bootstrap(BootstrapArgs),
}

#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Namespace the reconciler is installed in.
    #[arg(long, default_value = "argocd")]
    pub namespace: String,

    /// Print the files that would be written without committing.
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(cmd: RepoCommand, settings: &Settings) -> Result<()> {
    match cmd {
        RepoCommand::Bootstrap(args) => bootstrap(args, settings),
    }
}

fn bootstrap(args: BootstrapArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let opts = BootstrapOptions {
        namespace: args.namespace,
        dry_run: args.dry_run,
    };
    let outcome = writer
        .bootstrap(&opts)
        .with_context(|| format!("failed to bootstrap '{}'", writer.meta_ref().url))?;

    match outcome {
        BootstrapOutcome::Pushed { revision } => {
            println!(
                "✓ Bootstrapped '{}' ({})",
                writer.meta_ref().url,
                short_rev(&revision)
            );
        }
        BootstrapOutcome::WouldWrite { files } => {
            println!("[dry-run] would write:");
            for file in files {
                println!("  {}", file.display());
            }
        }
    }
    Ok(())
}
