use std::collections::BTreeSet;

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::menu::routes::{legacy_route, legacy_routes, route_for};
use crate::menu::{catalog, normalize_url};

#[derive(Subcommand)]
pub enum MenuCommands {
    #[command(about = "Print the menu catalog")]
    Tree {
        #[arg(long, help = "Open every folder")]
        all: bool,
    },

    #[command(about = "Show which menu a backend URL maps to")]
    Resolve {
        #[arg(help = "Backend URL, legacy or current")]
        url: String,
    },

    #[command(about = "List the legacy URL translations")]
    Routes,
}

pub async fn handle(cmd: MenuCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let catalog = catalog();

    match cmd {
        MenuCommands::Tree { all } => {
            match output_format {
                OutputFormat::Json => {
                    let tree = json!({ "menu": catalog.roots() });
                    println!("{}", serde_json::to_string_pretty(&tree)?);
                }
                OutputFormat::Text => {
                    let top: BTreeSet<String> =
                        catalog.roots().iter().map(|n| n.id.clone()).collect();
                    print!("{}", render_tree(catalog, &BTreeSet::new(), &top, all));
                }
            }
            Ok(())
        }
        MenuCommands::Resolve { url } => {
            let normalized = normalize_url(&url)
                .ok_or_else(|| anyhow::anyhow!("'{}' is not a usable URL", url))?;
            let route = route_for(&normalized);
            let node = catalog.node_for_route(route);
            let path: Vec<&str> = node
                .map(|n| catalog.ancestors(&n.id))
                .unwrap_or_default();

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({
                        "url": url,
                        "normalized": normalized,
                        "legacy": legacy_route(&normalized).is_some(),
                        "route": route,
                        "node": node.map(|n| n.id.as_str()),
                        "ancestors": path,
                    }))?);
                }
                OutputFormat::Text => {
                    println!("Normalized: {}", normalized);
                    println!("Route: {}", route);
                    match node {
                        Some(n) if path.is_empty() => println!("Menu: {} ({})", n.name, n.id),
                        Some(n) => println!("Menu: {} > {} ({})", path.join(" > "), n.name, n.id),
                        None => println!("Menu: not mapped"),
                    }
                }
            }
            Ok(())
        }
        MenuCommands::Routes => {
            match output_format {
                OutputFormat::Json => {
                    let routes: Vec<_> = legacy_routes()
                        .iter()
                        .map(|(legacy, route)| json!({ "legacy": legacy, "route": route }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "routes": routes }))?);
                }
                OutputFormat::Text => {
                    for (legacy, route) in legacy_routes() {
                        println!("{:<44} -> {}", legacy, route);
                    }
                }
            }
            Ok(())
        }
    }
}
