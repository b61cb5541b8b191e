use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("TASKSYNC_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8787".to_string());
        if bind_addr.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "TASKSYNC_BIND_ADDR must not be empty".to_string(),
            ));
        }

        let database_path = env::var("TASKSYNC_DB")
            .map_or_else(|_| PathBuf::from("tasksync-server.db"), PathBuf::from);

        Ok(Self {
            bind_addr,
            database_path,
        })
    }
}
