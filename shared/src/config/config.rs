use std::fs;
use tracing::{debug, error, info};

use crate::types::client_config::{AppConfig, ConfigError};

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let mut config: AppConfig = toml::from_str(&contents)?;
    config.api.base_url = config.api.resolved_base_url();

    info!("Configuration loaded successfully");
    debug!("Config: {:?}", config);

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::InvalidConfig("base_url cannot be empty".into()));
    }

    // The transport speaks plain HTTP; TLS is terminated in front of it.
    if !base_url.starts_with("http://") {
        return Err(ConfigError::InvalidConfig(
            "base_url must start with http://".into(),
        ));
    }

    if config.api.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "request_timeout_secs must be greater than 0".into(),
        ));
    }

    if config.auth.token_file.as_os_str().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "token_file cannot be empty".into(),
        ));
    }

    if config.auth.local_dev
        && config
            .auth
            .idp_login_url
            .as_deref()
            .is_none_or(|url| url.trim().is_empty())
    {
        return Err(ConfigError::InvalidConfig(
            "idp_login_url must be set when local_dev is enabled".into(),
        ));
    }

    if config.cache.freshness_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "freshness_secs must be greater than 0".into(),
        ));
    }

    if config.notifications.max_queue == 0 {
        return Err(ConfigError::InvalidConfig(
            "max_queue must be greater than 0".into(),
        ));
    }

    Ok(())
}
