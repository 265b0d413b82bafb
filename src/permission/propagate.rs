use std::collections::BTreeSet;

use crate::menu::MenuCatalog;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Propagation {
    /// Input ids known to the catalog plus all of their ancestors
    pub allowed: BTreeSet<String>,
    /// Ancestor folders to open in a tree view so checked nodes are visible
    pub expanded: BTreeSet<String>,
}

/// Add every ancestor folder of each assigned id.
///
/// Ids the catalog does not know are dropped. Running this on its own
/// output returns the same sets.
pub fn propagate(assigned: &BTreeSet<String>, catalog: &MenuCatalog) -> Propagation {
    let mut out = Propagation::default();

    for id in assigned {
        let Some(path) = catalog.path_to(id) else {
            tracing::debug!("dropping id '{}' not present in menu catalog", id);
            continue;
        };

        if let Some((_, ancestors)) = path.split_last() {
            for ancestor in ancestors {
                out.allowed.insert(ancestor.id.clone());
                out.expanded.insert(ancestor.id.clone());
            }
        }
        out.allowed.insert(id.clone());
    }

    out
}
