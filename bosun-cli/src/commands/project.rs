//! `bosun project` — create, delete, list and inspect tenants.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use bosun_core::types::ProjectName;
use bosun_writer::{ProjectCreateOptions, ProjectOutcome};

use crate::settings::{ConfigRegistrar, Settings};

use super::{parse_key_values, print_json, short_rev};

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project and its generated AppProject/ApplicationSet pair.
    Create(CreateArgs),

    /// Delete a project and detach it from every application.
    Delete(DeleteArgs),

    /// List projects.
    List(ListArgs),

    /// Show one project in full.
    Get(GetArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Project name; becomes projects/<name>.yaml.
    pub name: String,

    /// Kube context to attach as the default destination. Must appear in
    /// the clusters map of the config file.
    #[arg(long, value_name = "CONTEXT")]
    pub dest_kube_context: Option<String>,

    /// Extra label on the generated objects, repeatable (key=value).
    #[arg(long = "label", value_name = "KEY=VALUE")]
    pub labels: Vec<String>,

    /// Extra annotation on the generated objects, repeatable (key=value).
    #[arg(long = "annotation", value_name = "KEY=VALUE")]
    pub annotations: Vec<String>,

    /// Render the manifest to stdout without committing.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Project name.
    pub name: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Project name.
    pub name: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: ProjectCommand, settings: &Settings) -> Result<()> {
    match cmd {
        ProjectCommand::Create(args) => create(args, settings),
        ProjectCommand::Delete(args) => delete(args, settings),
        ProjectCommand::List(args) => list(args, settings),
        ProjectCommand::Get(args) => get(args, settings),
    }
}

fn create(args: CreateArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let registrar = ConfigRegistrar::new(settings.clusters.clone());
    let opts = ProjectCreateOptions {
        name: ProjectName::from(args.name.as_str()),
        dest_kube_context: args.dest_kube_context,
        labels: parse_key_values(&args.labels)?,
        annotations: parse_key_values(&args.annotations)?,
        dry_run: args.dry_run,
    };

    let outcome = writer
        .create_project(&opts, Some(&registrar))
        .with_context(|| format!("failed to create project '{}'", args.name))?;

    match outcome {
        ProjectOutcome::Pushed { revision } => {
            println!("✓ Added project '{}' ({})", args.name, short_rev(&revision));
        }
        ProjectOutcome::Rendered { manifest } => {
            println!("[dry-run] projects/{}.yaml:", args.name);
            print!("{manifest}");
            if !manifest.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn delete(args: DeleteArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let revision = writer
        .delete_project(&ProjectName::from(args.name.as_str()))
        .with_context(|| format!("failed to delete project '{}'", args.name))?;
    println!(
        "✓ Deleted project '{}' ({})",
        args.name,
        short_rev(&revision)
    );
    Ok(())
}

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "namespace")]
    namespace: String,
    #[tabled(rename = "default cluster")]
    default_cluster: String,
    #[tabled(rename = "gitops repo")]
    gitops_repo: String,
}

fn list(args: ListArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let projects = writer.list_projects().context("failed to list projects")?;

    if args.json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("No projects yet.");
        println!("Run: bosun project create <name>");
        return Ok(());
    }

    let rows: Vec<ProjectRow> = projects
        .into_iter()
        .map(|p| ProjectRow {
            name: p.name.0,
            namespace: p.namespace,
            default_cluster: p.default_cluster,
            gitops_repo: p.gitops_repo,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn get(args: GetArgs, settings: &Settings) -> Result<()> {
    let writer = settings.writer()?;
    let detail = writer
        .get_project(&ProjectName::from(args.name.as_str()))
        .with_context(|| format!("failed to get project '{}'", args.name))?;

    if args.json {
        return print_json(&detail);
    }

    println!("{}", detail.summary.name.0.bold());
    println!("  namespace:       {}", detail.summary.namespace);
    println!("  default cluster: {}", detail.summary.default_cluster);
    println!("  gitops repo:     {}", detail.summary.gitops_repo);
    if !detail.description.is_empty() {
        println!("  description:     {}", detail.description);
    }
    if !detail.source_repos.is_empty() {
        println!("  source repos:");
        for repo in &detail.source_repos {
            println!("    - {repo}");
        }
    }
    if !detail.cluster_resource_whitelist.is_empty() {
        println!("  cluster resources:");
        for resource in &detail.cluster_resource_whitelist {
            println!("    - {}/{}", resource.group, resource.kind);
        }
    }
    if !detail.namespace_resource_whitelist.is_empty() {
        println!("  namespace resources:");
        for resource in &detail.namespace_resource_whitelist {
            println!("    - {}/{}", resource.group, resource.kind);
        }
    }
    Ok(())
}
