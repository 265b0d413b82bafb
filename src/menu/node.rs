use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

/// Whether a node groups other screens or is a directly assignable screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Leaf,
}

/// One entry in the static menu catalog
#[derive(Debug, Clone, Serialize)]
pub struct MenuNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    pub fn folder(id: impl Into<String>, name: impl Into<String>, children: Vec<MenuNode>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Folder,
            route: None,
            children,
        }
    }

    pub fn leaf(id: impl Into<String>, name: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Leaf,
            route: Some(route.into()),
            children: Vec::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Duplicate node id: {0}")]
    DuplicateId(String),

    #[error("Duplicate node name '{name}' on nodes '{first}' and '{second}'")]
    DuplicateName { name: String, first: String, second: String },

    #[error("Duplicate route '{route}' on nodes '{first}' and '{second}'")]
    DuplicateRoute { route: String, first: String, second: String },

    #[error("Leaf node '{0}' cannot have children")]
    LeafWithChildren(String),

    #[error("Folder node '{0}' cannot carry a route")]
    FolderWithRoute(String),

    #[error("Node id cannot be empty")]
    EmptyId,
}

/// Immutable menu tree with lookup indexes.
///
/// Nodes are addressed by their child-index path from the roots so the
/// indexes never borrow into the tree. Ids, names and routes are unique
/// across the whole catalog; construction fails otherwise.
#[derive(Debug, Clone)]
pub struct MenuCatalog {
    roots: Vec<MenuNode>,
    paths: HashMap<String, Vec<usize>>,
    by_name: HashMap<String, String>,
    by_route: HashMap<String, String>,
    order: Vec<String>,
}

impl MenuCatalog {
    pub fn new(roots: Vec<MenuNode>) -> Result<Self, CatalogError> {
        let mut pending: Vec<(Vec<usize>, &MenuNode)> = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, node)| (vec![i], node))
            .collect();

        let mut paths = HashMap::new();
        let mut by_name: HashMap<String, String> = HashMap::new();
        let mut by_route: HashMap<String, String> = HashMap::new();
        let mut order = Vec::new();

        // Explicit stack keeps pre-order without recursion
        while let Some((path, node)) = pending.pop() {
            Self::validate_node(node)?;

            if paths.insert(node.id.clone(), path.clone()).is_some() {
                return Err(CatalogError::DuplicateId(node.id.clone()));
            }
            if let Some(first) = by_name.insert(node.name.clone(), node.id.clone()) {
                return Err(CatalogError::DuplicateName {
                    name: node.name.clone(),
                    first,
                    second: node.id.clone(),
                });
            }
            if let Some(route) = &node.route {
                if let Some(first) = by_route.insert(route.clone(), node.id.clone()) {
                    return Err(CatalogError::DuplicateRoute {
                        route: route.clone(),
                        first,
                        second: node.id.clone(),
                    });
                }
            }
            order.push(node.id.clone());

            for (i, child) in node.children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(i);
                pending.push((child_path, child));
            }
        }
        drop(pending);

        Ok(Self {
            roots,
            paths,
            by_name,
            by_route,
            order,
        })
    }

    fn validate_node(node: &MenuNode) -> Result<(), CatalogError> {
        if node.id.trim().is_empty() {
            return Err(CatalogError::EmptyId);
        }
        match node.kind {
            NodeKind::Leaf if !node.children.is_empty() => {
                Err(CatalogError::LeafWithChildren(node.id.clone()))
            }
            NodeKind::Folder if node.route.is_some() => {
                Err(CatalogError::FolderWithRoute(node.id.clone()))
            }
            _ => Ok(()),
        }
    }

    pub fn roots(&self) -> &[MenuNode] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.paths.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&MenuNode> {
        let path = self.paths.get(id)?;
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for i in rest {
            node = node.children.get(*i)?;
        }
        Some(node)
    }

    /// Node ids in depth-first pre-order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Exact display-name match. Names are unique, so this is the same node
    /// a depth-first search would hit first.
    pub fn find_by_name(&self, name: &str) -> Option<&MenuNode> {
        self.by_name.get(name).and_then(|id| self.get(id))
    }

    pub fn node_for_route(&self, route: &str) -> Option<&MenuNode> {
        self.by_route.get(route).and_then(|id| self.get(id))
    }

    /// Depth-first path search from every root. Returns the chain of nodes
    /// from a root down to and including `id`.
    pub fn path_to(&self, id: &str) -> Option<Vec<&MenuNode>> {
        fn search<'a>(node: &'a MenuNode, id: &str, trail: &mut Vec<&'a MenuNode>) -> bool {
            trail.push(node);
            if node.id == id {
                return true;
            }
            for child in &node.children {
                if search(child, id, trail) {
                    return true;
                }
            }
            trail.pop();
            false
        }

        let mut trail = Vec::new();
        for root in &self.roots {
            if search(root, id, &mut trail) {
                return Some(trail);
            }
        }
        None
    }

    /// Ancestor ids of `id`, outermost first. Empty for roots and unknown ids.
    pub fn ancestors(&self, id: &str) -> Vec<&str> {
        match self.path_to(id) {
            Some(mut path) => {
                path.pop();
                path.into_iter().map(|n| n.id.as_str()).collect()
            }
            None => Vec::new(),
        }
    }

    /// Every node below `id` in pre-order, excluding `id` itself
    pub fn descendants(&self, id: &str) -> Vec<&MenuNode> {
        let mut out = Vec::new();
        if let Some(node) = self.get(id) {
            let mut stack: Vec<&MenuNode> = node.children.iter().rev().collect();
            while let Some(current) = stack.pop() {
                out.push(current);
                stack.extend(current.children.iter().rev());
            }
        }
        out
    }

    pub fn descendant_leaves(&self, id: &str) -> Vec<&MenuNode> {
        self.descendants(id)
            .into_iter()
            .filter(|n| !n.is_folder())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MenuCatalog {
        MenuCatalog::new(vec![
            MenuNode::folder("a", "A", vec![
                MenuNode::leaf("a1", "A1", "/a/1"),
                MenuNode::folder("a2", "A2", vec![MenuNode::leaf("a2x", "A2X", "/a/2/x")]),
            ]),
            MenuNode::leaf("b", "B", "/b"),
        ])
        .unwrap()
    }

    #[test]
    fn test_pre_order_ids() {
        let catalog = sample();
        let ids: Vec<&str> = catalog.ids().collect();
        assert_eq!(ids, vec!["a", "a1", "a2", "a2x", "b"]);
    }

    #[test]
    fn test_path_and_ancestors() {
        let catalog = sample();
        let path: Vec<&str> = catalog
            .path_to("a2x")
            .unwrap()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(path, vec!["a", "a2", "a2x"]);
        assert_eq!(catalog.ancestors("a2x"), vec!["a", "a2"]);
        assert!(catalog.ancestors("b").is_empty());
        assert!(catalog.path_to("missing").is_none());
    }

    #[test]
    fn test_descendant_leaves() {
        let catalog = sample();
        let leaves: Vec<&str> = catalog
            .descendant_leaves("a")
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(leaves, vec!["a1", "a2x"]);
        assert!(catalog.descendant_leaves("b").is_empty());
    }

    #[test]
    fn test_lookup_by_name_and_route() {
        let catalog = sample();
        assert_eq!(catalog.find_by_name("A2X").map(|n| n.id.as_str()), Some("a2x"));
        assert_eq!(catalog.node_for_route("/b").map(|n| n.id.as_str()), Some("b"));
        assert!(catalog.find_by_name("nope").is_none());
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = MenuCatalog::new(vec![
            MenuNode::leaf("x", "Same", "/x"),
            MenuNode::leaf("y", "Same", "/y"),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName { .. }));
    }

    #[test]
    fn test_rejects_duplicate_ids_and_routes() {
        let err = MenuCatalog::new(vec![
            MenuNode::leaf("x", "X", "/x"),
            MenuNode::folder("f", "F", vec![MenuNode::leaf("x", "X2", "/x2")]),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId("x".to_string()));

        let err = MenuCatalog::new(vec![
            MenuNode::leaf("x", "X", "/same"),
            MenuNode::leaf("y", "Y", "/same"),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateRoute { .. }));
    }

    #[test]
    fn test_rejects_leaf_with_children() {
        let mut leaf = MenuNode::leaf("x", "X", "/x");
        leaf.children.push(MenuNode::leaf("y", "Y", "/y"));
        assert_eq!(
            MenuCatalog::new(vec![leaf]).unwrap_err(),
            CatalogError::LeafWithChildren("x".to_string())
        );
    }
}
