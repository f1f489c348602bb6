//! Configuration module
//!
//! Environment-based configuration for the admission subsystem: database
//! connection settings, queue batch sizing, and the runner liveness window
//! used by the online-matcher directory.

use std::env;

// Common defaults
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const QUEUE_BATCH_SIZE: i64 = 100;
const RUNNER_ONLINE_WINDOW_SECS: i64 = 7200;

/// Admission subsystem configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Maximum number of pending builds returned per queue poll.
    pub queue_batch_size: i64,
    /// How far back a runner heartbeat may be for the runner to count as online.
    pub runner_online_window_secs: i64,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let config = Config {
            database_url: env::var("QUARRY_DATABASE_URL")
                .or_else(|_| env::var("DATABASE_URL"))
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            queue_batch_size: env::var("QUEUE_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(QUEUE_BATCH_SIZE),
            runner_online_window_secs: env::var("RUNNER_ONLINE_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(RUNNER_ONLINE_WINDOW_SECS),
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.queue_batch_size <= 0 {
            anyhow::bail!("QUEUE_BATCH_SIZE must be positive");
        }
        if self.runner_online_window_secs <= 0 {
            anyhow::bail!("RUNNER_ONLINE_WINDOW_SECS must be positive");
        }
        if self.db_max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be positive");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            database_url: "postgres://localhost/quarry_test".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            queue_batch_size: QUEUE_BATCH_SIZE,
            runner_online_window_secs: RUNNER_ONLINE_WINDOW_SECS,
            environment: "test".to_string(),
        }
    }

    #[test]
    fn defaults_validate() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_batch_size() {
        let mut config = base_config();
        config.queue_batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_online_window() {
        let mut config = base_config();
        config.runner_online_window_secs = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn production_detection() {
        let mut config = base_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
    }
}
