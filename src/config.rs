use std::env;

use crate::sync::time::TimeNormalizer;

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Weather source
    pub source_base_url: String,
    pub source_timeout_seconds: u64,
    pub source_utc_offset_minutes: i64,

    // Sync settings
    pub sync_setup_on_start: bool,
    pub sync_update_interval_seconds: u64,
    pub sync_fetch_concurrency: usize,

    // API settings
    pub api_host: String,
    pub api_port: u16,
    pub api_concurrency_limit: usize,

    // Caching
    pub cache_ttl_seconds: u64,
    pub cache_max_bytes: u64,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,

            // Weather source
            source_base_url: env::var("SOURCE_BASE_URL")
                .map_err(|_| ConfigError::Missing("SOURCE_BASE_URL"))?,
            source_timeout_seconds: parse_or("SOURCE_TIMEOUT_SECONDS", 60),
            source_utc_offset_minutes: parse_or("SOURCE_UTC_OFFSET_MINUTES", 120),

            // Sync settings
            sync_setup_on_start: parse_or("SYNC_SETUP_ON_START", true),
            sync_update_interval_seconds: parse_or("SYNC_UPDATE_INTERVAL_SECONDS", 3600),
            sync_fetch_concurrency: parse_or("SYNC_FETCH_CONCURRENCY", 1).max(1),

            // API settings
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: parse_or("API_PORT", 3000),
            api_concurrency_limit: parse_or("API_CONCURRENCY_LIMIT", 64).max(1),

            // Caching
            cache_ttl_seconds: parse_or("CACHE_TTL_SECONDS", 300), // 5 minutes default
            cache_max_bytes: parse_or("CACHE_MAX_BYTES", 52_428_800), // 50MB default

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Normalizer for the source's fixed reporting offset.
    #[must_use]
    pub fn time_normalizer(&self) -> TimeNormalizer {
        TimeNormalizer::from_offset_minutes(self.source_utc_offset_minutes)
    }
}

/// Read an optional variable, falling back to `default` when unset or unparsable.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_optional_variables_fall_back_to_default() {
        assert_eq!(parse_or("WEATHER_DB_TEST_NEVER_SET", 120_i64), 120);
        assert!(parse_or("WEATHER_DB_TEST_NEVER_SET", true));
    }

    #[test]
    fn deployment_names_are_case_insensitive() {
        assert!(matches!(Deployment::from_str("PRODUCTION"), Deployment::Prod));
        assert!(matches!(Deployment::from_str("staging"), Deployment::Stage));
        assert!(matches!(Deployment::from_str("anything"), Deployment::Local));
    }
}
