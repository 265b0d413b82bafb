use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{Session, SessionError, SessionStore};

const SESSION_FILE: &str = "session.json";

pub fn get_config_dir() -> Result<PathBuf, SessionError> {
    if let Some(dir) = &crate::config::config().session.config_dir {
        return Ok(dir.clone());
    }
    let home = std::env::var("HOME")
        .map_err(|_| SessionError::ConfigDir("HOME environment variable not set".to_string()))?;
    Ok(PathBuf::from(home).join(".config").join("sr-console"))
}

/// Session persisted as JSON in the console's config directory, readable by
/// the owner only on Unix
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(SESSION_FILE),
        }
    }

    pub fn from_config() -> Result<Self, SessionError> {
        Ok(Self::new(get_config_dir()?))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>, SessionError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let content = serde_json::to_string_pretty(session)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path).await?;

        // An existing file keeps its old mode on open
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
        }

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local session, used by tests and short-lived tools
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    pub fn snapshot(&self) -> Option<Session> {
        self.session.lock().ok().and_then(|s| s.clone())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.snapshot())
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Ok(mut slot) = self.session.lock() {
            *slot = Some(session.clone());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        if let Ok(mut slot) = self.session.lock() {
            *slot = None;
        }
        Ok(())
    }
}
