use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::mapper::map_row;
use super::resolution::Resolution;
use super::row::AssignedRow;
use crate::menu::{MenuCatalog, MenuNode};

/// Outcome of translating checked node ids into backend identifiers.
///
/// `applied` is what gets submitted, deduplicated in first-seen order.
/// `skipped` holds checked ids that could not be resolved; the save still
/// goes ahead without them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

impl Reconciliation {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    fn apply<'a>(&mut self, keys: impl IntoIterator<Item = &'a String>) {
        for key in keys {
            if !self.applied.iter().any(|k| k == key) {
                self.applied.push(key.clone());
            }
        }
    }
}

/// Reverses a `Resolution`: checked node ids back to backend identifiers
pub struct Reconciler<'a> {
    catalog: &'a MenuCatalog,
    resolution: &'a Resolution,
}

impl<'a> Reconciler<'a> {
    pub fn new(catalog: &'a MenuCatalog, resolution: &'a Resolution) -> Self {
        Self { catalog, resolution }
    }

    /// Resolve every checked id using the tables from the last mapping pass.
    ///
    /// Catalog ids are visited in menu order, other ids afterwards in sorted
    /// order. A folder with a checked descendant is only an ancestor marker
    /// and contributes nothing itself; a folder checked on its own stands for
    /// all of its mapped descendant leaves. A folder with nothing mapped below
    /// it contributes nothing and is not reported as skipped.
    pub fn reconcile(&self, checked: &BTreeSet<String>) -> Reconciliation {
        let mut out = Reconciliation::default();

        let in_catalog = self.catalog.ids().filter(|id| checked.contains(*id));
        let foreign = checked.iter().map(String::as_str).filter(|id| !self.catalog.contains(id));

        for id in in_catalog.chain(foreign) {
            if self.resolution.known_keys.contains(id) {
                out.apply([&id.to_string()]);
                continue;
            }
            if let Some(keys) = self.resolution.id_to_keys.get(id) {
                out.apply(keys);
                continue;
            }

            let Some(node) = self.catalog.get(id) else {
                tracing::warn!(
                    "checked id '{}' is neither a menu node nor a known program",
                    id
                );
                out.skipped.push(id.to_string());
                continue;
            };

            if node.is_folder() {
                if self.has_checked_descendant(node, checked) {
                    continue;
                }
                let keys = self.descendant_keys(node);
                if !keys.is_empty() {
                    out.apply(&keys);
                    continue;
                }
            }

            if let Some(keys) = self.resolution.name_to_keys.get(&node.name) {
                out.apply(keys);
                continue;
            }

            if node.is_folder() {
                tracing::debug!("folder '{}' has no mapped programs below it", id);
                continue;
            }

            tracing::debug!("no backend identifier for checked node '{}'", id);
            out.skipped.push(id.to_string());
        }

        out
    }

    /// Retry skipped ids against a freshly fetched full program list.
    /// Ids that still do not resolve stay in `skipped`.
    pub fn recover(&self, previous: Reconciliation, fresh: &[AssignedRow]) -> Reconciliation {
        if previous.skipped.is_empty() {
            return previous;
        }

        let mut fresh_keys: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in fresh {
            let mapping = map_row(row, self.catalog, Some(fresh));
            if let (Some(node_id), Some(key)) = (mapping.node_id, mapping.backend_key) {
                let keys = fresh_keys.entry(node_id).or_default();
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }

        let mut out = Reconciliation {
            applied: previous.applied,
            skipped: Vec::new(),
        };

        for id in previous.skipped {
            let keys = match self.catalog.get(&id) {
                Some(_) => fresh_keys.get(&id).cloned().unwrap_or_default(),
                None => fresh
                    .iter()
                    .filter_map(|row| row.backend_key.clone())
                    .filter(|key| *key == id)
                    .take(1)
                    .collect(),
            };

            if keys.is_empty() {
                tracing::warn!(
                    "dropping checked id '{}' from save: no backend identifier",
                    id
                );
                out.skipped.push(id);
            } else {
                out.apply(&keys);
            }
        }

        out
    }

    fn has_checked_descendant(&self, node: &MenuNode, checked: &BTreeSet<String>) -> bool {
        self.catalog
            .descendants(&node.id)
            .iter()
            .any(|d| checked.contains(&d.id))
    }

    fn descendant_keys(&self, node: &MenuNode) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for leaf in self.catalog.descendant_leaves(&node.id) {
            for key in self.resolution.id_to_keys.get(&leaf.id).into_iter().flatten() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }
}
