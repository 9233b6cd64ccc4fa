use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Backend root, e.g. `"http://127.0.0.1:3000/api"`.
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Where the identity provider's login page lives. Only used when
    /// `local_dev` is set; otherwise the backend tells us where to go.
    #[serde(default)]
    pub idp_login_url: Option<String>,
    #[serde(default)]
    pub local_dev: bool,
    /// Passed to the backend's authorize callback.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// File holding the durable bearer token.
    pub token_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_freshness")]
    pub freshness_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    #[serde(default = "default_max_queue")]
    pub max_queue: usize,
    #[serde(default = "default_notification_ttl")]
    pub ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the API root with the `ALIAS_API_URL` env-var taking priority
    /// over the config file field.
    pub fn resolved_base_url(&self) -> String {
        std::env::var("ALIAS_API_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.base_url.clone())
    }
}

impl CacheConfig {
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }
}

impl NotificationConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            idp_login_url: None,
            local_dev: false,
            redirect_uri: default_redirect_uri(),
            token_file: PathBuf::from("token.toml"),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_secs: default_freshness(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_queue: default_max_queue(),
            ttl_secs: default_notification_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_request_timeout() -> u64 {
    30
}

pub fn default_redirect_uri() -> String {
    "/".to_string()
}

pub fn default_freshness() -> u64 {
    3600
}

pub fn default_max_queue() -> usize {
    32
}

pub fn default_notification_ttl() -> u64 {
    5
}

pub fn default_log_level() -> String {
    "info".to_string()
}
