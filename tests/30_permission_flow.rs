mod common;

use std::collections::BTreeSet;

use anyhow::Result;
use serde_json::{json, Value};
use sr_console::error::ClientError;
use sr_console::permission::Resolution;
use sr_console::services::{LoadOutcome, PermissionService};
use sr_console::session::MemorySessionStore;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{assigned_path, client_for, received_bodies, session, PROGRAM_LIST_PATH, ROLE};

fn assigned_rows() -> Value {
    json!({ "data": [
        {
            "progrmSn": "101",
            "progrmUri": "/user/mngr/retrievePagingList.do",
            "progrmNm": "사용자관리"
        },
        { "progrmSn": "201", "progrmUri": "/sr/requst/retrievePagingList.do?menuNo=3" },
        { "progrmSn": "41", "progrmNm": "질의응답" },
        { "progrmSn": "50", "progrmUri": "/bbs/notice/retrievePagingList.do", "menuIndictYn": "N" },
        { "progrmSn": "999", "progrmUri": "/legacy/removed.do", "progrmNm": "폐기메뉴" }
    ]})
}

fn program_list() -> Value {
    json!([
        { "progrmSn": "101", "progrmNm": "사용자관리" },
        { "progrmSn": "201", "progrmNm": "SR요청" },
        { "progrmSn": "41", "progrmNm": "질의응답" },
        { "progrmSn": "50", "progrmNm": "공지사항" }
    ])
}

async fn mount_json(server: &MockServer, http_method: &str, route: String, body: Value) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn load(service: &PermissionService<MemorySessionStore>) -> Result<(Resolution, bool)> {
    match service.load_role(ROLE).await? {
        LoadOutcome::Loaded { resolution, degraded } => Ok((resolution, degraded)),
        LoadOutcome::AlreadyLoading => anyhow::bail!("unexpected in-flight load"),
    }
}

fn set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn load_maps_rows_and_propagates_ancestors() -> Result<()> {
    let server = MockServer::start().await;
    mount_json(&server, "GET", assigned_path(ROLE), assigned_rows()).await;
    mount_json(&server, "GET", PROGRAM_LIST_PATH.to_string(), program_list()).await;

    let service = PermissionService::new(client_for(&server, Some(session("a1", None))));
    let (resolution, degraded) = load(&service).await?;

    assert!(!degraded);
    assert_eq!(
        resolution.allowed,
        set(&["admin", "basic-info", "board", "qna", "sr", "sr-request", "user-mgmt"])
    );
    assert!(!resolution.is_allowed("notice"));
    assert_eq!(resolution.expanded, set(&["admin", "basic-info", "board", "sr"]));
    assert_eq!(resolution.missing.len(), 1);
    assert_eq!(resolution.missing[0].backend_key.as_deref(), Some("999"));

    assert_eq!(service.resolution(ROLE), Some(resolution));
    assert!(!service.is_loading(ROLE));
    Ok(())
}

#[tokio::test]
async fn saving_loaded_state_submits_the_same_keys() -> Result<()> {
    let server = MockServer::start().await;
    mount_json(&server, "GET", assigned_path(ROLE), assigned_rows()).await;
    mount_json(&server, "GET", PROGRAM_LIST_PATH.to_string(), program_list()).await;
    let saved = json!({ "success": true });
    mount_json(&server, "PUT", format!("/api/v1/program-access/{}", ROLE), saved).await;

    let service = PermissionService::new(client_for(&server, Some(session("a1", None))));
    let (resolution, _) = load(&service).await?;

    let plan = service.save_role(ROLE, &resolution.allowed).await?;
    assert_eq!(plan.applied, vec!["101", "201", "41"]);
    assert!(plan.skipped.is_empty());

    let bodies = received_bodies(&server, "PUT", &format!("/api/v1/program-access/{}", ROLE)).await;
    assert_eq!(bodies, vec![json!({ "programIds": ["101", "201", "41"] })]);
    Ok(())
}

#[tokio::test]
async fn checked_folder_expands_to_its_mapped_leaves() -> Result<()> {
    let server = MockServer::start().await;
    mount_json(&server, "GET", assigned_path(ROLE), json!([
        { "progrmSn": "201", "progrmUri": "/sr/requst/retrievePagingList.do" },
        { "progrmSn": "202", "progrmUri": "/sr/rcept/retrievePagingList.do", "menuIndictYn": "N" }
    ]))
    .await;
    mount_json(&server, "GET", PROGRAM_LIST_PATH.to_string(), json!([])).await;

    let service = PermissionService::new(client_for(&server, Some(session("a1", None))))
        .with_recover_on_save(false);
    load(&service).await?;

    let plan = service.plan_save(ROLE, &set(&["sr"])).await?;
    assert_eq!(plan.applied, vec!["201", "202"]);
    Ok(())
}

#[tokio::test]
async fn unresolved_ids_are_retried_against_a_fresh_program_list() -> Result<()> {
    let server = MockServer::start().await;
    mount_json(&server, "GET", assigned_path(ROLE), assigned_rows()).await;
    Mock::given(method("GET"))
        .and(path(PROGRAM_LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(program_list()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROGRAM_LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "progrmSn": "204", "progrmUri": "/sr/verify/retrievePagingList.do" }
        ])))
        .mount(&server)
        .await;
    let saved = json!({ "success": true });
    mount_json(&server, "PUT", format!("/api/v1/program-access/{}", ROLE), saved).await;

    let service = PermissionService::new(client_for(&server, Some(session("a1", None))))
        .with_recover_on_save(true);
    load(&service).await?;

    let plan = service.save_role(ROLE, &set(&["user-mgmt", "sr-verify", "mypage"])).await?;
    assert_eq!(plan.applied, vec!["101", "204"]);
    assert_eq!(plan.skipped, vec!["mypage"]);

    let bodies = received_bodies(&server, "PUT", &format!("/api/v1/program-access/{}", ROLE)).await;
    assert_eq!(bodies, vec![json!({ "programIds": ["101", "204"] })]);
    Ok(())
}

#[tokio::test]
async fn failed_fetch_falls_back_to_previous_state() -> Result<()> {
    let server = MockServer::start().await;
    mount_json(&server, "GET", assigned_path(ROLE), assigned_rows()).await;
    mount_json(&server, "GET", PROGRAM_LIST_PATH.to_string(), program_list()).await;

    let service = PermissionService::new(client_for(&server, Some(session("a1", None))));
    let (first, _) = load(&service).await?;

    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (second, degraded) = load(&service).await?;
    assert!(degraded);
    assert_eq!(second, first);
    Ok(())
}

#[tokio::test]
async fn failed_first_fetch_yields_empty_state() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = PermissionService::new(client_for(&server, Some(session("a1", None))));
    let (resolution, degraded) = load(&service).await?;

    assert!(degraded);
    assert!(resolution.allowed.is_empty());
    assert!(resolution.expanded.is_empty());
    Ok(())
}

#[tokio::test]
async fn ended_session_surfaces_from_load() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server, Some(session("stale", Some("r1"))));
    let service = PermissionService::new(client.clone());

    let err = service.load_role(ROLE).await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired | ClientError::NotAuthenticated));
    assert!(client.store().snapshot().is_none());
    assert!(!service.is_loading(ROLE));
    Ok(())
}

#[tokio::test]
async fn expired_token_during_load_refreshes_once() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(assigned_path(ROLE)))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(assigned_rows()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROGRAM_LIST_PATH))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(program_list()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "fresh", "refreshToken": "r2"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server, Some(session("stale", Some("r1"))));
    let service = PermissionService::new(client.clone());
    let (resolution, degraded) = load(&service).await?;

    assert!(!degraded);
    assert!(resolution.is_allowed("user-mgmt"));
    assert_eq!(received_bodies(&server, "POST", "/api/v1/auth/refresh").await.len(), 1);
    let stored = client.store().snapshot().expect("session kept");
    assert_eq!(stored.access_token, "fresh");
    Ok(())
}
