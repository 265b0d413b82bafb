use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::mapper::map_row;
use super::propagate::propagate;
use super::row::{AssignedRow, Assignment};
use crate::menu::MenuCatalog;

/// A backend row no heuristic could place in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingMapping {
    pub backend_key: Option<String>,
    pub name: Option<String>,
    pub urls: Vec<String>,
    pub assignment: Assignment,
}

impl From<&AssignedRow> for MissingMapping {
    fn from(row: &AssignedRow) -> Self {
        Self {
            backend_key: row.backend_key.clone(),
            name: row.name.clone(),
            urls: row.urls.clone(),
            assignment: row.assignment,
        }
    }
}

/// Result of mapping one role's assigned rows onto the menu catalog.
///
/// The lookup tables are kept so a later save can translate checked node
/// ids back into backend identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub allowed: BTreeSet<String>,
    pub expanded: BTreeSet<String>,
    pub id_to_keys: BTreeMap<String, Vec<String>>,
    pub name_to_keys: BTreeMap<String, Vec<String>>,
    pub known_keys: BTreeSet<String>,
    pub missing: Vec<MissingMapping>,
}

impl Resolution {
    pub fn is_allowed(&self, id: &str) -> bool {
        self.allowed.contains(id)
    }

    fn record_key(table: &mut BTreeMap<String, Vec<String>>, entry: &str, key: &str) {
        let keys = table.entry(entry.to_string()).or_default();
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
}

/// Map every row, propagate ancestors, and apply unassignment precedence.
///
/// An id named by an `N` row never ends up allowed, whether it was added by
/// a `Y` row or by ancestor propagation.
pub fn resolve(
    rows: &[AssignedRow],
    catalog: &MenuCatalog,
    full_list: Option<&[AssignedRow]>,
) -> Resolution {
    let mut resolution = Resolution::default();
    let mut granted: BTreeSet<String> = BTreeSet::new();
    let mut revoked: BTreeSet<String> = BTreeSet::new();

    for entry in full_list.unwrap_or_default() {
        if let Some(key) = &entry.backend_key {
            resolution.known_keys.insert(key.clone());
            if let Some(name) = &entry.name {
                Resolution::record_key(&mut resolution.name_to_keys, name, key);
            }
        }
    }

    for row in rows {
        let mapping = map_row(row, catalog, full_list);

        if let Some(key) = &mapping.backend_key {
            resolution.known_keys.insert(key.clone());
            if let Some(name) = &row.name {
                Resolution::record_key(&mut resolution.name_to_keys, name, key);
            }
        }

        let Some(node_id) = mapping.node_id else {
            tracing::debug!(
                "unmapped program row key={:?} name={:?} urls={:?}",
                row.backend_key,
                row.name,
                row.urls
            );
            resolution.missing.push(MissingMapping::from(row));
            continue;
        };

        match &mapping.backend_key {
            Some(key) => Resolution::record_key(&mut resolution.id_to_keys, &node_id, key),
            None => tracing::debug!("node '{}' mapped without a backend identifier", node_id),
        }

        match row.assignment {
            Assignment::Assigned => granted.insert(node_id),
            Assignment::Unassigned => revoked.insert(node_id),
        };
    }

    let direct: BTreeSet<String> = granted.difference(&revoked).cloned().collect();
    let propagation = propagate(&direct, catalog);

    resolution.allowed = propagation
        .allowed
        .into_iter()
        .filter(|id| !revoked.contains(id))
        .collect();
    resolution.expanded = propagation.expanded;

    if !resolution.missing.is_empty() {
        tracing::warn!("{} program row(s) could not be mapped to a menu", resolution.missing.len());
    }

    resolution
}
