use std::collections::BTreeSet;

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::menu::MenuCatalog;
use crate::permission::{propagate, Reconciliation, Resolution};
use crate::services::{LoadOutcome, PermissionService};
use crate::session::SessionStore;

#[derive(Subcommand)]
pub enum AccessCommands {
    #[command(about = "Show the menu tree with the role's assigned programs checked")]
    Show {
        #[arg(help = "Role code")]
        role: String,
        #[arg(long, help = "Open every folder, not only those with checked entries")]
        all: bool,
    },

    #[command(about = "List backend rows that could not be mapped to a menu")]
    Missing {
        #[arg(help = "Role code")]
        role: String,
    },

    #[command(about = "Replace the role's program access with the given menu nodes")]
    Save {
        #[arg(help = "Role code")]
        role: String,
        #[arg(help = "Menu node ids to assign", required = true)]
        nodes: Vec<String>,
        #[arg(long, help = "Show what would be submitted without saving")]
        dry_run: bool,
    },

    #[command(about = "Add menu nodes to the role's current access")]
    Grant {
        #[arg(help = "Role code")]
        role: String,
        #[arg(help = "Menu node ids to add", required = true)]
        nodes: Vec<String>,
        #[arg(long, help = "Show what would be submitted without saving")]
        dry_run: bool,
    },

    #[command(about = "Remove menu nodes (and everything below them) from the role's access")]
    Revoke {
        #[arg(help = "Role code")]
        role: String,
        #[arg(help = "Menu node ids to remove", required = true)]
        nodes: Vec<String>,
        #[arg(long, help = "Show what would be submitted without saving")]
        dry_run: bool,
    },
}

async fn load<S: SessionStore>(
    service: &PermissionService<S>,
    role: &str,
) -> anyhow::Result<(Resolution, bool)> {
    match service.load_role(role).await? {
        LoadOutcome::Loaded { resolution, degraded } => Ok((resolution, degraded)),
        LoadOutcome::AlreadyLoading => {
            Err(anyhow::anyhow!("Access for role '{}' is already loading", role))
        }
    }
}

/// Like `load`, but refuses a fallback state since it is about to be edited
async fn load_current<S: SessionStore>(
    service: &PermissionService<S>,
    role: &str,
) -> anyhow::Result<Resolution> {
    let (resolution, degraded) = load(service, role).await?;
    if degraded {
        anyhow::bail!(
            "Current access for role '{}' could not be loaded; refusing to modify it",
            role
        );
    }
    Ok(resolution)
}

fn check_nodes(catalog: &MenuCatalog, nodes: &[String]) -> anyhow::Result<()> {
    let unknown: Vec<&str> = nodes
        .iter()
        .map(String::as_str)
        .filter(|id| !catalog.contains(id))
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Unknown menu node(s): {}", unknown.join(", ")))
    }
}

/// Explicitly held entries of a resolution: leaves, plus folders that carry
/// their own backend identifier
fn held_entries(catalog: &MenuCatalog, resolution: &Resolution) -> BTreeSet<String> {
    resolution
        .allowed
        .iter()
        .filter(|id| {
            let is_leaf = catalog.get(id).map_or(false, |n| !n.is_folder());
            is_leaf || resolution.id_to_keys.contains_key(*id)
        })
        .cloned()
        .collect()
}

fn with_granted(
    catalog: &MenuCatalog,
    mut held: BTreeSet<String>,
    nodes: &[String],
) -> BTreeSet<String> {
    for id in nodes {
        match catalog.get(id) {
            Some(node) if node.is_folder() => {
                held.extend(catalog.descendant_leaves(id).into_iter().map(|n| n.id.clone()));
            }
            _ => {
                held.insert(id.clone());
            }
        }
    }
    held
}

fn without_revoked(
    catalog: &MenuCatalog,
    mut held: BTreeSet<String>,
    nodes: &[String],
) -> BTreeSet<String> {
    for id in nodes {
        held.remove(id);
        for node in catalog.descendants(id) {
            held.remove(&node.id);
        }
    }
    held
}

fn print_plan(
    output_format: &OutputFormat,
    role: &str,
    plan: &Reconciliation,
    dry_run: bool,
) -> anyhow::Result<()> {
    let message = if dry_run {
        format!("Would save {} program id(s) for role {}", plan.applied.len(), role)
    } else {
        format!("Saved {} program id(s) for role {}", plan.applied.len(), role)
    };

    output_success(
        output_format,
        &message,
        Some(json!({
            "role": role,
            "dry_run": dry_run,
            "applied": plan.applied,
            "skipped": plan.skipped,
        })),
    )?;

    if let OutputFormat::Text = output_format {
        if !plan.applied.is_empty() {
            println!("Program ids: {}", plan.applied.join(", "));
        }
        if !plan.skipped.is_empty() {
            println!("Skipped (no backend identifier): {}", plan.skipped.join(", "));
        }
    }
    Ok(())
}

async fn submit<S: SessionStore>(
    service: &PermissionService<S>,
    role: &str,
    checked: &BTreeSet<String>,
    dry_run: bool,
) -> anyhow::Result<Reconciliation> {
    let plan = if dry_run {
        service.plan_save(role, checked).await?
    } else {
        service.save_role(role, checked).await?
    };
    Ok(plan)
}

pub async fn handle(cmd: AccessCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = PermissionService::new(build_client()?);
    let catalog = service.catalog();

    match cmd {
        AccessCommands::Show { role, all } => {
            let (resolution, degraded) = load(&service, &role).await?;

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({
                        "role": role,
                        "degraded": degraded,
                        "allowed": resolution.allowed,
                        "expanded": resolution.expanded,
                        "missing": resolution.missing,
                    }))?);
                }
                OutputFormat::Text => {
                    if degraded {
                        eprintln!(
                            "Warning: could not load current access, showing last known state"
                        );
                    }
                    let tree = render_tree(catalog, &resolution.allowed, &resolution.expanded, all);
                    print!("{}", tree);
                    if !resolution.missing.is_empty() {
                        println!(
                            "{} backend row(s) not mapped to a menu, see `srctl access missing {}`",
                            resolution.missing.len(),
                            role
                        );
                    }
                }
            }
            Ok(())
        }
        AccessCommands::Missing { role } => {
            let (resolution, _) = load(&service, &role).await?;
            if resolution.missing.is_empty() {
                return output_empty_collection(
                    &output_format,
                    "missing",
                    "Every backend row maps to a menu",
                );
            }

            match output_format {
                OutputFormat::Json => {
                    let missing = json!({ "missing": resolution.missing });
                    println!("{}", serde_json::to_string_pretty(&missing)?);
                }
                OutputFormat::Text => {
                    for row in &resolution.missing {
                        println!(
                            "{:<10} {:<24} {}",
                            row.backend_key.as_deref().unwrap_or("-"),
                            row.name.as_deref().unwrap_or("-"),
                            row.urls.join(" ")
                        );
                    }
                }
            }
            Ok(())
        }
        AccessCommands::Save { role, nodes, dry_run } => {
            check_nodes(catalog, &nodes)?;
            load(&service, &role).await?;
            let checked: BTreeSet<String> = nodes.into_iter().collect();
            let plan = submit(&service, &role, &checked, dry_run).await?;
            print_plan(&output_format, &role, &plan, dry_run)
        }
        AccessCommands::Grant { role, nodes, dry_run } => {
            check_nodes(catalog, &nodes)?;
            let resolution = load_current(&service, &role).await?;
            let held = with_granted(catalog, held_entries(catalog, &resolution), &nodes);
            let checked = propagate(&held, catalog).allowed;
            let plan = submit(&service, &role, &checked, dry_run).await?;
            print_plan(&output_format, &role, &plan, dry_run)
        }
        AccessCommands::Revoke { role, nodes, dry_run } => {
            check_nodes(catalog, &nodes)?;
            let resolution = load_current(&service, &role).await?;
            let held = without_revoked(catalog, held_entries(catalog, &resolution), &nodes);
            let checked = propagate(&held, catalog).allowed;
            let plan = submit(&service, &role, &checked, dry_run).await?;
            print_plan(&output_format, &role, &plan, dry_run)
        }
    }
}
