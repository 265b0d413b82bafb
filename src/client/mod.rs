pub mod envelope;

use std::time::Duration;

use chrono::Utc;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use url::Url;

use crate::error::ClientError;
use crate::permission::AssignedRow;
use crate::session::{token_expiry, Session, SessionStore};
use envelope::{into_rows, TokenResponse};

/// JSON client for the SR backend.
///
/// Every authorized call carries the stored access token. A 401 triggers
/// one refresh-token exchange and one repeat of the request; a second 401
/// clears the stored session and yields `ClientError::SessionExpired`.
///
/// Refreshes are single-flight: concurrent requests rejected with the same
/// access token share one exchange.
pub struct ApiClient<S: SessionStore> {
    http: reqwest::Client,
    base_url: Url,
    store: S,
    refresh_lock: Mutex<()>,
}

impl<S: SessionStore> ApiClient<S> {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
        store: S,
    ) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url,
            store,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn from_config(store: S) -> Result<Self, ClientError> {
        let api = &crate::config::config().api;
        Self::new(&api.base_url, Duration::from_secs(api.timeout_secs), &api.user_agent, store)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn session(&self) -> Result<Option<Session>, ClientError> {
        Ok(self.store.load().await?)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    pub async fn login(&self, user_id: &str, password: &str) -> Result<Session, ClientError> {
        let url = self.endpoint(&["api", "v1", "auth", "login"])?;
        let response = self
            .http
            .post(url)
            .json(&json!({ "userId": user_id, "password": password }))
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;
        let token = TokenResponse::from_value(body)?;

        let mut session = Self::session_from_token(token, None);
        if session.user_id.is_none() {
            session.user_id = Some(user_id.to_string());
        }
        self.store.save(&session).await?;

        tracing::info!("logged in as {}", user_id);
        Ok(session)
    }

    /// Exchange the refresh token for a new access token. A rejected refresh
    /// token ends the session.
    pub async fn refresh(&self) -> Result<Session, ClientError> {
        let _exchange = self.refresh_lock.lock().await;
        let current = self.store.load().await?.ok_or(ClientError::NotAuthenticated)?;
        self.exchange_refresh_token(current).await
    }

    /// Refresh after `rejected` got a 401. When another caller already
    /// replaced that token while this one waited, the stored session is
    /// returned as is.
    async fn refresh_rejected(&self, rejected: &str) -> Result<Session, ClientError> {
        let _exchange = self.refresh_lock.lock().await;
        let current = self.store.load().await?.ok_or(ClientError::SessionExpired)?;
        if current.access_token != rejected {
            tracing::debug!("access token already refreshed by a concurrent request");
            return Ok(current);
        }
        self.exchange_refresh_token(current).await
    }

    async fn exchange_refresh_token(&self, current: Session) -> Result<Session, ClientError> {
        let Some(refresh_token) = current.refresh_token.clone() else {
            self.force_logout().await;
            return Err(ClientError::SessionExpired);
        };

        let url = self.endpoint(&["api", "v1", "auth", "refresh"])?;
        let response = self
            .http
            .post(url)
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("refresh token rejected");
            self.force_logout().await;
            return Err(ClientError::SessionExpired);
        }

        let body: Value = Self::check(response).await?.json().await?;
        let token = TokenResponse::from_value(body)?;
        let session = Self::session_from_token(token, Some(&current));
        self.store.save(&session).await?;

        tracing::debug!("access token refreshed, expires at {:?}", session.expires_at);
        Ok(session)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.store.clear().await?;
        Ok(())
    }

    async fn force_logout(&self) {
        if let Err(e) = self.store.clear().await {
            tracing::error!("failed to clear session: {}", e);
        }
    }

    fn session_from_token(token: TokenResponse, previous: Option<&Session>) -> Session {
        let expires_at = token
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
            .or_else(|| token_expiry(&token.access_token));

        Session {
            expires_at,
            refresh_token: token
                .refresh_token
                .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
            user_id: token.user_id.or_else(|| previous.and_then(|p| p.user_id.clone())),
            role_code: token.role_code.or_else(|| previous.and_then(|p| p.role_code.clone())),
            access_token: token.access_token,
        }
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status { status: status.as_u16(), body })
    }

    async fn send_authorized<F>(&self, build: F) -> Result<Response, ClientError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let session = self.store.load().await?.ok_or(ClientError::NotAuthenticated)?;
        let response = build(&self.http).bearer_auth(&session.access_token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check(response).await;
        }

        tracing::info!("access token rejected, refreshing once");
        let refreshed = self.refresh_rejected(&session.access_token).await?;

        let retry = build(&self.http).bearer_auth(&refreshed.access_token).send().await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("request still unauthorized after refresh, clearing session");
            self.force_logout().await;
            return Err(ClientError::SessionExpired);
        }
        Self::check(retry).await
    }

    async fn get_rows(&self, url: Url) -> Result<Vec<AssignedRow>, ClientError> {
        let response = self.send_authorized(|http| http.get(url.clone())).await?;
        let body: Value = response.json().await?;
        Ok(into_rows(body)?.iter().map(AssignedRow::from_json).collect())
    }

    // ------------------------------------------------------------------
    // Program access
    // ------------------------------------------------------------------

    /// Assigned and explicitly unassigned programs of a role
    pub async fn fetch_assigned(&self, role_code: &str) -> Result<Vec<AssignedRow>, ClientError> {
        let url = self.endpoint(&["api", "v1", "program-access", role_code, "assigned"])?;
        let rows = self.get_rows(url).await?;
        tracing::debug!("fetched {} assigned row(s) for role {}", rows.len(), role_code);
        Ok(rows)
    }

    /// Every program the backend knows, used as the fallback source of
    /// identifiers and names
    pub async fn fetch_program_list(
        &self,
        role_code: &str,
    ) -> Result<Vec<AssignedRow>, ClientError> {
        let mut url = self.endpoint(&["api", "v1", "program-access"])?;
        url.query_pairs_mut().append_pair("authorCode", role_code);
        let rows = self.get_rows(url).await?;
        tracing::debug!("fetched {} program row(s) for role {}", rows.len(), role_code);
        Ok(rows)
    }

    pub async fn update_program_access(
        &self,
        role_code: &str,
        program_ids: &[String],
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "v1", "program-access", role_code])?;
        let body = json!({ "programIds": program_ids });
        self.send_authorized(|http| http.put(url.clone()).json(&body)).await?;
        tracing::info!("saved {} program id(s) for role {}", program_ids.len(), role_code);
        Ok(())
    }
}
