use serde::Serialize;

use super::row::AssignedRow;
use crate::menu::{routes, MenuCatalog};

/// How a row was matched to a catalog node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Url,
    Name,
    FullListUrl,
    FullListName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowMapping {
    pub node_id: Option<String>,
    pub backend_key: Option<String>,
    pub source: Option<MatchSource>,
}

impl RowMapping {
    pub fn is_mapped(&self) -> bool {
        self.node_id.is_some()
    }
}

/// Resolve one backend row to a catalog node and the identifier to send back
/// when that node is saved.
///
/// Resolution order, first hit wins: the row's URLs, the row's name, then
/// the URLs and names of full-list entries that match the row by key, URL
/// or name. Pure; callers accumulate the results.
pub fn map_row(
    row: &AssignedRow,
    catalog: &MenuCatalog,
    full_list: Option<&[AssignedRow]>,
) -> RowMapping {
    let (node_id, source) = match resolve_direct(row, catalog) {
        Some((id, source)) => (Some(id), Some(source)),
        None => match full_list.and_then(|list| resolve_via_full_list(row, catalog, list)) {
            Some((id, source)) => (Some(id), Some(source)),
            None => (None, None),
        },
    };

    RowMapping {
        node_id,
        backend_key: backend_key_for(row, full_list),
        source,
    }
}

/// Node id for the first URL on the row that lands on a catalog route
pub fn resolve_urls(row: &AssignedRow, catalog: &MenuCatalog) -> Option<String> {
    row.normalized_urls().iter().find_map(|url| {
        catalog
            .node_for_route(routes::route_for(url))
            .map(|node| node.id.clone())
    })
}

pub fn resolve_name(row: &AssignedRow, catalog: &MenuCatalog) -> Option<String> {
    let name = row.name.as_deref()?;
    catalog.find_by_name(name).map(|node| node.id.clone())
}

fn resolve_direct(row: &AssignedRow, catalog: &MenuCatalog) -> Option<(String, MatchSource)> {
    if let Some(id) = resolve_urls(row, catalog) {
        return Some((id, MatchSource::Url));
    }
    resolve_name(row, catalog).map(|id| (id, MatchSource::Name))
}

fn resolve_via_full_list(
    row: &AssignedRow,
    catalog: &MenuCatalog,
    full_list: &[AssignedRow],
) -> Option<(String, MatchSource)> {
    let related = full_list
        .iter()
        .filter(|entry| {
            entry.shares_key_with(row) || entry.shares_url_with(row) || entry.shares_name_with(row)
        });

    for entry in related {
        if let Some(id) = resolve_urls(entry, catalog) {
            return Some((id, MatchSource::FullListUrl));
        }
        if let Some(id) = resolve_name(entry, catalog) {
            return Some((id, MatchSource::FullListName));
        }
    }
    None
}

/// The row's own identifier, or one borrowed from a full-list entry with the
/// same name or normalized URL
pub fn backend_key_for(row: &AssignedRow, full_list: Option<&[AssignedRow]>) -> Option<String> {
    if let Some(key) = &row.backend_key {
        return Some(key.clone());
    }
    full_list?
        .iter()
        .filter(|entry| entry.shares_name_with(row) || entry.shares_url_with(row))
        .find_map(|entry| entry.backend_key.clone())
}
