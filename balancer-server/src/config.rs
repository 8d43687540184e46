//! Configuration module

use std::env;

use crate::engine::DEFAULT_TIME_WINDOW_MINUTES;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional Postgres URL for the audit trail
    pub database_url: Option<String>,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// SAFE MODE window used when a request does not specify one
    pub default_time_window_minutes: u32,

    /// Largest accepted threat batch
    pub max_batch_size: usize,

    /// Upper bound for a single balancing pass
    pub pass_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            port: 8080,
            environment: "development".to_string(),
            default_time_window_minutes: DEFAULT_TIME_WINDOW_MINUTES,
            max_batch_size: 5000,
            pass_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            environment: env::var("ENVIRONMENT")
                .unwrap_or(defaults.environment),

            default_time_window_minutes: env::var("DEFAULT_TIME_WINDOW_MINUTES")
                .ok()
                .and_then(|m| m.parse().ok())
                .filter(|m| *m > 0)
                .unwrap_or(defaults.default_time_window_minutes),

            max_batch_size: env::var("MAX_BATCH_SIZE")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.max_batch_size),

            pass_timeout_secs: env::var("PASS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pass_timeout_secs),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
