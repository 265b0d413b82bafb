// Client-side error types for calls against the SR backend
use thiserror::Error;

use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Session store error: {0}")]
    Session(#[from] SessionError),
}

impl ClientError {
    /// HTTP status the error corresponds to, when there is one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Status { status, .. } => Some(*status),
            ClientError::NotAuthenticated | ClientError::SessionExpired => Some(401),
            _ => None,
        }
    }

    /// Stable code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Http(_) => "HTTP_ERROR",
            ClientError::Status { status, .. } => match status {
                400 => "BAD_REQUEST",
                401 => "UNAUTHORIZED",
                403 => "FORBIDDEN",
                404 => "NOT_FOUND",
                409 => "CONFLICT",
                500..=599 => "SERVER_ERROR",
                _ => "UNEXPECTED_STATUS",
            },
            ClientError::Decode(_) => "INVALID_RESPONSE",
            ClientError::Url(_) => "INVALID_URL",
            ClientError::NotAuthenticated => "NOT_AUTHENTICATED",
            ClientError::SessionExpired => "SESSION_EXPIRED",
            ClientError::Session(_) => "SESSION_STORE_ERROR",
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
