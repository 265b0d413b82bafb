use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub mapping: MappingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Refresh the access token when it expires within this many seconds
    pub refresh_margin_secs: i64,
    pub refresh_interval_secs: u64,
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Fetch the full program list once more when a save has unresolved ids
    pub recover_on_save: bool,
    pub debug_logging: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("SR_API_BASE_URL") {
            self.api.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("SR_API_TIMEOUT_SECS") {
            self.api.timeout_secs = v.parse().unwrap_or(self.api.timeout_secs);
        }
        if let Ok(v) = env::var("SR_API_USER_AGENT") {
            self.api.user_agent = v;
        }

        // Session overrides
        if let Ok(v) = env::var("SR_SESSION_REFRESH_MARGIN_SECS") {
            self.session.refresh_margin_secs =
                v.parse().unwrap_or(self.session.refresh_margin_secs);
        }
        if let Ok(v) = env::var("SR_SESSION_REFRESH_INTERVAL_SECS") {
            self.session.refresh_interval_secs =
                v.parse().unwrap_or(self.session.refresh_interval_secs);
        }
        if let Ok(v) = env::var("SR_CONSOLE_CONFIG_DIR") {
            self.session.config_dir = Some(PathBuf::from(v));
        }

        // Mapping overrides
        if let Ok(v) = env::var("SR_MAPPING_RECOVER_ON_SAVE") {
            self.mapping.recover_on_save = v.parse().unwrap_or(self.mapping.recover_on_save);
        }
        if let Ok(v) = env::var("SR_MAPPING_DEBUG_LOGGING") {
            self.mapping.debug_logging = v.parse().unwrap_or(self.mapping.debug_logging);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                timeout_secs: 30,
                user_agent: format!("srctl/{}", env!("CARGO_PKG_VERSION")),
            },
            session: SessionConfig {
                refresh_margin_secs: 120,
                refresh_interval_secs: 60,
                config_dir: None,
            },
            mapping: MappingConfig {
                recover_on_save: true,
                debug_logging: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://sr-staging.example.com".to_string(),
                timeout_secs: 15,
                user_agent: format!("srctl/{}", env!("CARGO_PKG_VERSION")),
            },
            session: SessionConfig {
                refresh_margin_secs: 300,
                refresh_interval_secs: 60,
                config_dir: None,
            },
            mapping: MappingConfig {
                recover_on_save: true,
                debug_logging: false,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://sr.example.com".to_string(),
                timeout_secs: 10,
                user_agent: format!("srctl/{}", env!("CARGO_PKG_VERSION")),
            },
            session: SessionConfig {
                refresh_margin_secs: 300,
                refresh_interval_secs: 30,
                config_dir: None,
            },
            mapping: MappingConfig {
                recover_on_save: true,
                debug_logging: false,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
