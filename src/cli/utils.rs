use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::client::ApiClient;
use crate::menu::{MenuCatalog, MenuNode};
use crate::session::FileSessionStore;

/// Client against the configured backend using the on-disk session
pub fn build_client() -> anyhow::Result<Arc<ApiClient<FileSessionStore>>> {
    let store = FileSessionStore::from_config()?;
    Ok(Arc::new(ApiClient::from_config(store)?))
}

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(Value::Object(extra)) = data {
                if let Some(object) = response.as_object_mut() {
                    object.extend(extra);
                }
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Checkbox tree of the catalog. Folders are opened when listed in
/// `expanded` or when `show_all` is set.
pub fn render_tree(
    catalog: &MenuCatalog,
    checked: &BTreeSet<String>,
    expanded: &BTreeSet<String>,
    show_all: bool,
) -> String {
    fn walk(
        node: &MenuNode,
        depth: usize,
        checked: &BTreeSet<String>,
        expanded: &BTreeSet<String>,
        show_all: bool,
        out: &mut String,
    ) {
        let mark = if checked.contains(&node.id) { "[x]" } else { "[ ]" };
        let open = show_all || expanded.contains(&node.id);
        let folder = match (node.is_folder(), open) {
            (true, true) => " ▾",
            (true, false) => " ▸",
            _ => "",
        };
        let indent = "  ".repeat(depth);
        out.push_str(&format!("{}{} {} ({}){}\n", indent, mark, node.name, node.id, folder));

        if node.is_folder() && open {
            for child in &node.children {
                walk(child, depth + 1, checked, expanded, show_all, out);
            }
        }
    }

    let mut out = String::new();
    for root in catalog.roots() {
        walk(root, 0, checked, expanded, show_all, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_tree_opens_expanded_folders_only() {
        let catalog = MenuCatalog::new(vec![
            MenuNode::folder("f", "Folder", vec![MenuNode::leaf("l", "Leaf", "/l")]),
            MenuNode::folder("g", "Closed", vec![MenuNode::leaf("m", "Hidden", "/m")]),
        ])
        .unwrap();

        let out = render_tree(&catalog, &set(&["f", "l"]), &set(&["f"]), false);
        assert_eq!(out, "[x] Folder (f) ▾\n  [x] Leaf (l)\n[ ] Closed (g) ▸\n");

        let all = render_tree(&catalog, &set(&[]), &set(&[]), true);
        assert!(all.contains("  [ ] Hidden (m)"));
    }
}
