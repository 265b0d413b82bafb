pub mod refresher;
pub mod store;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use refresher::spawn_refresher;
pub use store::{FileSessionStore, MemorySessionStore};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config directory unavailable: {0}")]
    ConfigDir(String),
}

/// Tokens and identity of the logged-in operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
    pub role_code: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            user_id: None,
            role_code: None,
        }
    }

    /// True when the token is already expired or expires within `margin`.
    /// A session without a known expiry never reports as expiring.
    pub fn expires_within(&self, margin: Duration) -> bool {
        match self.expires_at {
            Some(at) => at - margin <= Utc::now(),
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_within(Duration::zero())
    }
}

/// Where session tokens live between calls
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, SessionError>;
    async fn save(&self, session: &Session) -> Result<(), SessionError>;
    async fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    exp: Option<i64>,
}

/// Read the `exp` claim of an access token without verifying the signature.
/// The console is not the token authority; it only needs to know when to
/// refresh.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    data.claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
}
