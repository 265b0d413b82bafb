use once_cell::sync::Lazy;

use super::node::{MenuCatalog, MenuNode};

/// Built-in console menu. Built once on first use and never mutated.
pub static MENU: Lazy<MenuCatalog> =
    Lazy::new(|| MenuCatalog::new(builtin_nodes()).expect("built-in menu catalog is valid"));

pub fn catalog() -> &'static MenuCatalog {
    &MENU
}

fn builtin_nodes() -> Vec<MenuNode> {
    vec![
        MenuNode::folder("admin", "시스템관리", vec![
            MenuNode::folder("basic-info", "기본정보관리", vec![
                MenuNode::leaf("user-mgmt", "사용자관리", "/admin/users"),
                MenuNode::leaf("system-mgr", "시스템담당자관리", "/admin/system-managers"),
                MenuNode::leaf("dept-mgmt", "부서관리", "/admin/departments"),
                MenuNode::leaf("code-mgmt", "공통코드관리", "/admin/codes"),
            ]),
            MenuNode::folder("access-control", "권한관리", vec![
                MenuNode::leaf("role-mgmt", "권한그룹관리", "/admin/roles"),
                MenuNode::leaf("program-mgmt", "프로그램관리", "/admin/programs"),
                MenuNode::leaf("program-access", "프로그램권한관리", "/admin/program-access"),
            ]),
        ]),
        MenuNode::folder("sr", "SR관리", vec![
            MenuNode::leaf("sr-request", "SR요청", "/sr/requests"),
            MenuNode::leaf("sr-receive", "SR접수", "/sr/receipts"),
            MenuNode::leaf("sr-process", "SR처리", "/sr/processing"),
            MenuNode::leaf("sr-verify", "SR검증", "/sr/verifications"),
            MenuNode::leaf("sr-evaluate", "SR평가", "/sr/evaluations"),
            MenuNode::folder("sr-stats", "SR통계", vec![
                MenuNode::leaf("sr-stats-status", "SR현황", "/sr/stats/status"),
                MenuNode::leaf("sr-stats-period", "기간별통계", "/sr/stats/period"),
            ]),
        ]),
        MenuNode::folder("board", "게시판", vec![
            MenuNode::leaf("notice", "공지사항", "/board/notices"),
            MenuNode::leaf("qna", "질의응답", "/board/qna"),
        ]),
        MenuNode::leaf("mypage", "마이페이지", "/mypage"),
    ]
}
