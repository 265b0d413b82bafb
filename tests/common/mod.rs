#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use sr_console::client::ApiClient;
use sr_console::session::{MemorySessionStore, Session};
use wiremock::MockServer;

pub const ROLE: &str = "ROLE_ADMIN";

pub fn session(access_token: &str, refresh_token: Option<&str>) -> Session {
    let mut session = Session::new(access_token);
    session.refresh_token = refresh_token.map(str::to_string);
    session.user_id = Some("admin".to_string());
    session.role_code = Some(ROLE.to_string());
    session
}

/// Client against the mock backend with an in-memory session
pub fn client_for(
    server: &MockServer,
    session: Option<Session>,
) -> Arc<ApiClient<MemorySessionStore>> {
    let store = match session {
        Some(s) => MemorySessionStore::with_session(s),
        None => MemorySessionStore::new(),
    };
    let client = ApiClient::new(&server.uri(), Duration::from_secs(5), "srctl-test", store)
        .expect("mock server uri is a valid base url");
    Arc::new(client)
}

pub fn assigned_path(role: &str) -> String {
    format!("/api/v1/program-access/{}/assigned", role)
}

pub const PROGRAM_LIST_PATH: &str = "/api/v1/program-access";

/// JSON bodies of every request the mock received for a method and path
pub async fn received_bodies(server: &MockServer, method: &str, path: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == method && r.url.path() == path)
        .map(|r| serde_json::from_slice(&r.body).unwrap_or(Value::Null))
        .collect()
}
