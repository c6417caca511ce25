//! `bosun store` — manage Vault secret stores.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use bosun_core::{keys, types::StoreId};
use bosun_manifest::SecretStore;
use bosun_writer::StorePatch;

use crate::settings::Settings;

use super::{print_json, short_rev};

#[derive(Subcommand, Debug)]
pub enum StoreCommand {
    /// Create a secret store from a manifest file; the id is assigned here.
    Create(CreateArgs),

    /// Patch fields on an existing store.
    Update(UpdateArgs),

    /// Delete a store. Deleting an absent id succeeds quietly.
    Delete(DeleteArgs),

    /// List the stores of the default cluster context.
    List(ListArgs),

    /// Print one store as YAML.
    Get(GetArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// SecretStore manifest file.
    #[arg(long = "file", short = 'f', value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Store identifier (the bosun.dev/id annotation).
    pub id: String,

    /// New store name.
    #[arg(long)]
    pub name: Option<String>,

    /// New Vault server URL.
    #[arg(long)]
    pub server: Option<String>,

    /// New Vault KV path.
    #[arg(long)]
    pub path: Option<String>,

    /// YAML file holding the replacement Vault auth block.
    #[arg(long, value_name = "FILE")]
    pub auth_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Store identifier.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Store identifier.
    pub id: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: StoreCommand, settings: &Settings) -> Result<()> {
    match cmd {
        StoreCommand::Create(args) => create(args, settings),
        StoreCommand::Update(args) => update(args, settings),
        StoreCommand::Delete(args) => delete(args, settings),
        StoreCommand::List(args) => list(args, settings),
        StoreCommand::Get(args) => get(args, settings),
    }
}

fn create(args: CreateArgs, settings: &Settings) -> Result<()> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read '{}'", args.file.display()))?;
    let store = SecretStore::parse(&text)
        .with_context(|| format!("invalid secret store manifest '{}'", args.file.display()))?;

    let writer = settings.writer()?;
    let stored = writer
        .create_secret_store(store, false)
        .context("failed to create secret store")?;
    println!(
        "✓ Added secret store '{}' (id {})",
        stored.name(),
        stored.id().unwrap_or("unassigned")
    );
    Ok(())
}

fn update(args: UpdateArgs, settings: &Settings) -> Result<()> {
    let auth = match args.auth_file.as_deref() {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("cannot read '{}'", path.display()))?;
            Some(
                serde_yaml::from_str(&text)
                    .with_context(|| format!("invalid auth block '{}'", path.display()))?,
            )
        }
        None => None,
    };
    let patch = StorePatch {
        name: args.name,
        server: args.server,
        path: args.path,
        auth,
    };

    let writer = settings.writer()?;
    let stored = writer
        .update_secret_store(&StoreId::from(args.id.as_str()), &patch)
        .with_context(|| format!("failed to update secret store '{}'", args.id))?;
    println!("✓ Updated secret store '{}'", stored.name());
    Ok(())
}

fn delete(args: DeleteArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let pushed = writer
        .delete_secret_store(&StoreId::from(args.id.as_str()))
        .with_context(|| format!("failed to delete secret store '{}'", args.id))?;
    match pushed {
        Some(revision) => println!(
            "✓ Deleted secret store '{}' ({})",
            args.id,
            short_rev(&revision)
        ),
        None => println!("Secret store '{}' was not there; nothing to delete.", args.id),
    }
    Ok(())
}

#[derive(Tabled)]
struct StoreRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "server")]
    server: String,
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "created")]
    created: String,
}

fn list(args: ListArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let stores = writer
        .list_secret_stores()
        .context("failed to list secret stores")?;

    if args.json {
        return print_json(&stores);
    }
    if stores.is_empty() {
        println!("No secret stores yet.");
        println!("Run: bosun store create -f <file.yaml>");
        return Ok(());
    }

    let rows: Vec<StoreRow> = stores.iter().map(store_row).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn store_row(store: &SecretStore) -> StoreRow {
    let vault = store.spec.provider.vault.as_ref();
    StoreRow {
        id: store.id().unwrap_or_default().to_string(),
        name: store.name().to_string(),
        server: vault.map(|v| v.server.clone()).unwrap_or_default(),
        path: vault
            .and_then(|v| v.path.clone())
            .unwrap_or_default(),
        created: store
            .metadata
            .annotations
            .get(keys::ANNOTATION_CREATED_AT)
            .cloned()
            .unwrap_or_default(),
    }
}

fn get(args: GetArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let store = writer
        .get_secret_store(&StoreId::from(args.id.as_str()))
        .with_context(|| format!("failed to get secret store '{}'", args.id))?;

    if args.json {
        return print_json(&store);
    }
    let yaml = store
        .to_yaml()
        .context("failed to render secret store YAML")?;
    print!("{yaml}");
    if !yaml.ends_with('\n') {
        println!();
    }
    Ok(())
}
