pub mod config;

pub use self::config::{load_config, validate_config};

use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

use crate::types::client_config::{AppConfig, AuthConfig, ConfigError};

/// Shared handle to the client config. Clones see each other's reloads.
#[derive(Clone, Debug)]
pub struct LiveConfig(Arc<RwLock<AppConfig>>);

impl LiveConfig {
    pub fn new(config: AppConfig) -> Self {
        Self(Arc::new(RwLock::new(config)))
    }

    /// Short-lived guard only; copy values out before awaiting anything.
    pub async fn read(&self) -> RwLockReadGuard<'_, AppConfig> {
        self.0.read().await
    }

    /// Copy of the `[auth]` section, for callers that await afterwards.
    pub async fn auth(&self) -> AuthConfig {
        self.0.read().await.auth.clone()
    }

    pub async fn reload(&self, new: AppConfig) {
        *self.0.write().await = new;
    }

    /// Re-read `path`. The current config stays in place if the file fails
    /// to load or validate.
    pub async fn reload_from(&self, path: &str) -> Result<(), ConfigError> {
        match load_config(path) {
            Ok(config) => {
                self.reload(config).await;
                info!("Reloaded configuration from {}", path);
                Ok(())
            }
            Err(e) => {
                warn!("Keeping previous configuration: {}", e);
                Err(e)
            }
        }
    }
}
