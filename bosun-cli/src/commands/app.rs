//! `bosun app` — install, remove, list and inspect applications.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use bosun_core::types::{AppName, ProjectName};
use bosun_writer::{AppCreateOptions, AppCreated, RawManifestSource};

use crate::settings::Settings;
use crate::{InstallModeArg, SourceKindArg};

use super::{parse_key_values, print_json, short_rev};

#[derive(Subcommand, Debug)]
pub enum AppCommand {
    /// Install an application into a project.
    Create(CreateArgs),

    /// Remove an application, entirely or from one project.
    Delete(DeleteArgs),

    /// List the applications installed into a project.
    List(ListArgs),

    /// Show one application.
    Get(GetArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Application name; becomes the directory under apps/.
    pub name: String,

    /// Source specifier: <url>[//<path>][?ref=<revision>].
    #[arg(long = "app", value_name = "SPECIFIER")]
    pub app: String,

    /// Project to install into.
    #[arg(long, short = 'p')]
    pub project: String,

    /// Application type: helm | kustomize | directory. Defaults to directory.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub kind: Option<SourceKindArg>,

    /// Helm install mode: flatten | nested.
    #[arg(long, value_name = "MODE")]
    pub install_mode: Option<InstallModeArg>,

    /// Environment to render, repeatable. Detected from the source checkout
    /// when omitted.
    #[arg(long = "env", value_name = "NAME")]
    pub environments: Vec<String>,

    /// Local checkout of the application source, used to detect
    /// environments and render manifests.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub source_path: PathBuf,

    /// Destination namespace; 'default' when omitted.
    #[arg(long)]
    pub dest_namespace: Option<String>,

    /// Destination API server; the layout default when omitted.
    #[arg(long)]
    pub dest_server: Option<String>,

    /// Application code annotation.
    #[arg(long)]
    pub app_code: Option<String>,

    /// Description annotation.
    #[arg(long)]
    pub description: Option<String>,

    /// Extra label, repeatable (key=value).
    #[arg(long = "label", value_name = "KEY=VALUE")]
    pub labels: Vec<String>,

    /// Extra annotation, repeatable (key=value).
    #[arg(long = "annotation", value_name = "KEY=VALUE")]
    pub annotations: Vec<String>,

    /// Glob of source files to exclude (directory type only).
    #[arg(long)]
    pub exclude: Option<String>,

    /// Glob of source files to include (directory type only).
    #[arg(long)]
    pub include: Option<String>,

    /// Report per-environment manifests without committing.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Application name (the directory under apps/).
    pub name: String,

    /// Only detach this project's overlay; the whole application is removed
    /// when omitted.
    #[arg(long, short = 'p')]
    pub project: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project to list.
    #[arg(long, short = 'p')]
    pub project: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Application name.
    pub name: String,

    /// Owning project.
    #[arg(long, short = 'p')]
    pub project: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: AppCommand, settings: &Settings) -> Result<()> {
    match cmd {
        AppCommand::Create(args) => create(args, settings),
        AppCommand::Delete(args) => delete(args, settings),
        AppCommand::List(args) => list(args, settings),
        AppCommand::Get(args) => get(args, settings),
    }
}

fn create(args: CreateArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let source = RawManifestSource::new(&args.source_path);
    let opts = AppCreateOptions {
        project: ProjectName::from(args.project.as_str()),
        app_name: AppName::from(args.name.as_str()),
        app_specifier: args.app.clone(),
        kind: args.kind.clone().unwrap_or_default().into(),
        install_mode: args.install_mode.clone().unwrap_or_default().into(),
        environments: args.environments.clone(),
        dest_namespace: args.dest_namespace.clone().unwrap_or_default(),
        dest_server: args.dest_server.clone().unwrap_or_default(),
        app_code: args.app_code.clone(),
        description: args.description.clone(),
        labels: parse_key_values(&args.labels)?,
        annotations: parse_key_values(&args.annotations)?,
        exclude: args.exclude.clone().unwrap_or_default(),
        include: args.include.clone().unwrap_or_default(),
        dry_run: args.dry_run,
    };

    let created = writer
        .create_application(&opts, &source)
        .with_context(|| format!("failed to create app '{}'", args.name))?;

    if args.dry_run {
        print_dry_run(&args.name, &created);
        return Ok(());
    }

    let revision = created.revision.unwrap_or_default();
    println!(
        "✓ Created app '{}' in project '{}' ({})",
        args.name,
        args.project,
        short_rev(&revision)
    );
    for env in &created.environments {
        if !env.valid {
            println!(
                "  {} environment '{}' failed to render: {}",
                "!".yellow(),
                env.environment,
                env.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    Ok(())
}

fn print_dry_run(name: &str, created: &AppCreated) {
    println!(
        "[dry-run] app '{}', {} environment(s):",
        name, created.total
    );
    for env in &created.environments {
        if env.valid {
            println!("  {} {}", "✓".green(), env.environment);
        } else {
            println!(
                "  {} {}: {}",
                "✗".red(),
                env.environment,
                env.error.as_deref().unwrap_or("render failed")
            );
        }
    }
    for env in &created.environments {
        if let Some(manifest) = env.manifest.as_deref() {
            println!("--- # {}", env.environment);
            print!("{manifest}");
            if !manifest.ends_with('\n') {
                println!();
            }
        }
    }
}

fn delete(args: DeleteArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let project = args
        .project
        .as_deref()
        .map(ProjectName::from);
    let revision = writer
        .delete_application(&AppName::from(args.name.as_str()), project.as_ref())
        .with_context(|| format!("failed to delete app '{}'", args.name))?;

    match args.project.as_deref() {
        Some(project) => println!(
            "✓ Deleted app '{}' from project '{}' ({})",
            args.name,
            project,
            short_rev(&revision)
        ),
        None => println!("✓ Deleted app '{}' ({})", args.name, short_rev(&revision)),
    }
    Ok(())
}

#[derive(Tabled)]
struct AppRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "revision")]
    revision: String,
    #[tabled(rename = "cluster")]
    cluster: String,
    #[tabled(rename = "namespace")]
    namespace: String,
}

fn list(args: ListArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let apps = writer
        .list_applications(&ProjectName::from(args.project.as_str()))
        .with_context(|| format!("failed to list apps in project '{}'", args.project))?;

    if args.json {
        return print_json(&apps);
    }
    if apps.is_empty() {
        println!("No apps installed into project '{}'.", args.project);
        println!("Run: bosun app create <name> --app <specifier> --project {}", args.project);
        return Ok(());
    }

    let rows: Vec<AppRow> = apps
        .into_iter()
        .map(|app| {
            let target = app.targets.first();
            AppRow {
                name: app.name.0,
                source: app.source.repo,
                path: app.source.path,
                revision: app.source.target_revision,
                cluster: target.map(|t| t.cluster.clone()).unwrap_or_default(),
                namespace: target.map(|t| t.namespace.clone()).unwrap_or_default(),
            }
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn get(args: GetArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let app = writer
        .get_application(
            &ProjectName::from(args.project.as_str()),
            &AppName::from(args.name.as_str()),
        )
        .with_context(|| {
            format!(
                "failed to get app '{}' in project '{}'",
                args.name, args.project
            )
        })?;

    if args.json {
        return print_json(&app);
    }

    println!("{}", app.name.0.bold());
    println!("  project:  {}", app.instantiation.tenant_name);
    println!("  source:   {}", app.source.repo);
    println!("  path:     {}", app.source.path);
    if !app.source.target_revision.is_empty() {
        println!("  revision: {}", app.source.target_revision);
    }
    if let Some(code) = app.instantiation.app_code.as_deref() {
        println!("  app code: {code}");
    }
    if let Some(description) = app.instantiation.description.as_deref() {
        println!("  about:    {description}");
    }
    for target in &app.targets {
        println!("  target:   {} / {}", target.cluster, target.namespace);
    }
    println!(
        "  runtime:  health={} sync={}",
        app.runtime.health, app.runtime.sync_status
    );
    Ok(())
}
