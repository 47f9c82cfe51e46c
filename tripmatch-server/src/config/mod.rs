//! Configuration module for tripmatch-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;

use crate::config::file::FileConfig;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tripmatch_core::config::{
    MatchingConfig, NotificationsConfig, ServerConfig, SharedConfig, SweeperConfig,
};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub matching: MatchingConfig,
    pub sweeper: SweeperConfig,
    pub notifications: NotificationsConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(self.server, self.matching, self.sweeper, self.notifications)
    }

    /// Overwrite every reloadable section of `shared`.
    ///
    /// The notification buffer size is fixed once the channel exists, so a
    /// changed value only takes effect after a restart.
    pub async fn apply_to(self, shared: &SharedConfig) {
        *shared.server.write().await = self.server;
        *shared.matching.write().await = self.matching;
        *shared.sweeper.write().await = self.sweeper;

        let current = shared.notifications.read().await.channel_buffer;
        if current != self.notifications.channel_buffer {
            tracing::warn!(
                current,
                requested = self.notifications.channel_buffer,
                "notifications.channel_buffer changes require a restart"
            );
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn load_str(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        Ok(build_loaded_config(file_config))
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.sweeper.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "sweeper.interval_secs must be greater than zero".to_string(),
        ));
    }
    if config.sweeper.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "sweeper.batch_size must be greater than zero".to_string(),
        ));
    }
    if config.notifications.channel_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "notifications.channel_buffer must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        matching: MatchingConfig {
            strict_responses: file_config.matching.strict_responses,
        },
        sweeper: SweeperConfig {
            enabled: file_config.sweeper.enabled,
            interval: Duration::from_secs(file_config.sweeper.interval_secs),
            batch_size: file_config.sweeper.batch_size,
        },
        notifications: NotificationsConfig {
            channel_buffer: file_config.notifications.channel_buffer,
        },
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(listen: Option<SocketAddr>) -> ConfigLoader {
        ConfigLoader::new("./tripmatch.toml", listen)
    }

    #[test]
    fn test_listen_override_wins() {
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let loaded = loader(Some(addr))
            .load_str("[server]\nlisten = \"0.0.0.0:3000\"\n")
            .unwrap();
        assert_eq!(loaded.server.listen, addr);
    }

    #[test]
    fn test_sweeper_interval_converted_to_duration() {
        let loaded = loader(None)
            .load_str("[sweeper]\ninterval_secs = 90\n")
            .unwrap();
        assert_eq!(loaded.sweeper.interval, Duration::from_secs(90));
        assert_eq!(loaded.sweeper.batch_size, 50);
    }

    #[test]
    fn test_zero_values_fail_validation() {
        for content in [
            "[sweeper]\ninterval_secs = 0\n",
            "[sweeper]\nbatch_size = 0\n",
            "[notifications]\nchannel_buffer = 0\n",
        ] {
            let result = loader(None).load_str(content);
            assert!(
                matches!(result, Err(ConfigError::ValidationError(_))),
                "expected validation error for {content:?}"
            );
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ConfigLoader::new("/nonexistent/tripmatch.toml", None).load();
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[tokio::test]
    async fn test_apply_to_updates_reloadable_sections() {
        let shared = loader(None).load_str("").unwrap().into_shared();
        let reloaded = loader(None)
            .load_str("[matching]\nstrict_responses = false\n\n[sweeper]\nenabled = false\n")
            .unwrap();

        reloaded.apply_to(&shared).await;

        assert!(!shared.matching.read().await.strict_responses);
        assert!(!shared.sweeper.read().await.enabled);
    }
}
