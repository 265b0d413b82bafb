// Legacy program URLs as stored by the backend, mapped to console routes.
// Routes are then resolved to node ids through the catalog's route index.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use url::Url;

const LEGACY_ROUTES: &[(&str, &str)] = &[
    ("/user/mngr/retrievePagingList.do", "/admin/users"),
    ("/user/mngr/retrieveDetail.do", "/admin/users"),
    ("/sys/chrg/retrievePagingList.do", "/admin/system-managers"),
    ("/dept/mngr/retrievePagingList.do", "/admin/departments"),
    ("/cmmn/code/retrievePagingList.do", "/admin/codes"),
    ("/author/mngr/retrievePagingList.do", "/admin/roles"),
    ("/progrm/mngr/retrievePagingList.do", "/admin/programs"),
    ("/author/progrm/retrieveList.do", "/admin/program-access"),
    ("/sr/requst/retrievePagingList.do", "/sr/requests"),
    ("/sr/requst/retrieveDetail.do", "/sr/requests"),
    ("/sr/rcept/retrievePagingList.do", "/sr/receipts"),
    ("/sr/process/retrievePagingList.do", "/sr/processing"),
    ("/sr/verify/retrievePagingList.do", "/sr/verifications"),
    ("/sr/evl/retrievePagingList.do", "/sr/evaluations"),
    ("/sr/stats/sttus.do", "/sr/stats/status"),
    ("/sr/stats/pd.do", "/sr/stats/period"),
    ("/bbs/notice/retrievePagingList.do", "/board/notices"),
    ("/bbs/qna/retrievePagingList.do", "/board/qna"),
    ("/mypage/retrieveDetail.do", "/mypage"),
];

static LEGACY_INDEX: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| LEGACY_ROUTES.iter().copied().collect());

/// Canonical form of a URL-like backend field: trimmed, query string and
/// fragment stripped, absolute URLs reduced to their path, trailing slash
/// dropped (except for the root). Returns `None` for blank input.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let path = match Url::parse(trimmed) {
        Ok(parsed) if parsed.has_host() => parsed.path().to_string(),
        _ => {
            let end = trimmed.find(|c| c == '?' || c == '#').unwrap_or(trimmed.len());
            trimmed[..end].trim().to_string()
        }
    };

    if path.is_empty() {
        return None;
    }

    let mut path = if path.starts_with('/') { path } else { format!("/{}", path) };
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    Some(path)
}

/// Console route for a normalized legacy URL
pub fn legacy_route(normalized: &str) -> Option<&'static str> {
    LEGACY_INDEX.get(normalized).copied()
}

/// Route to look up in the catalog for a normalized URL: the legacy
/// translation when one exists, otherwise the URL itself.
pub fn route_for(normalized: &str) -> &str {
    legacy_route(normalized).unwrap_or(normalized)
}

pub fn legacy_routes() -> &'static [(&'static str, &'static str)] {
    LEGACY_ROUTES
}
