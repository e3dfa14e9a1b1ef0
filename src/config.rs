//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

/// Models tried in order by the AI pipeline when `AI_MODELS` is unset.
pub const DEFAULT_AI_MODELS: [&str; 5] = [
    "gemini-1.5-pro-001",
    "gemini-1.5-pro-002",
    "gemini-2.0-flash-001",
    "gemini-2.0-pro-exp-02-05",
    "gemini-1.5-flash-001",
];

/// Default base URL of the Generative Language REST API.
pub const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Top-level service configuration.
///
/// Loaded once at startup via [`MarketConfig::from_env`].
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// SQLite connection string.
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Run every counter resync pass once at startup.
    pub sync_counters_on_startup: bool,

    /// Allowed CORS origins. Empty means permissive.
    pub cors_allowed_origins: Vec<String>,

    /// Requests allowed per client IP inside one window.
    pub rate_limit_max_requests: usize,

    /// Length of the rate-limit window in seconds.
    pub rate_limit_window_secs: u64,

    /// Upper bound on handling time for a single request.
    pub request_timeout_secs: u64,

    /// API key for the generative AI service. `None` disables AI routes.
    pub ai_api_key: Option<String>,

    /// Base URL of the generative AI REST API.
    pub ai_base_url: String,

    /// Ordered model identifiers used for fallback.
    pub ai_models: Vec<String>,

    /// Timeout in seconds for one generative AI call.
    pub ai_timeout_secs: u64,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
}

impl MarketConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://market.db?mode=rwc".to_string());

        let ai_models = std::env::var("AI_MODELS")
            .map(|v| split_list(&v))
            .ok()
            .filter(|models| !models.is_empty())
            .unwrap_or_else(|| DEFAULT_AI_MODELS.iter().map(ToString::to_string).collect());

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 5),
            database_connect_timeout_secs: parse_env("DATABASE_CONNECT_TIMEOUT_SECS", 5),
            sync_counters_on_startup: parse_env_bool("SYNC_COUNTERS_ON_STARTUP", true),
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            rate_limit_max_requests: parse_env("RATE_LIMIT_MAX_REQUESTS", 60),
            rate_limit_window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", 60),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30),
            ai_api_key: std::env::var("AI_API_KEY").ok().filter(|k| !k.is_empty()),
            ai_base_url: std::env::var("AI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_AI_BASE_URL.to_string()),
            ai_models,
            ai_timeout_secs: parse_env("AI_TIMEOUT_SECS", 30),
            log_json: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }

    /// Rate-limit window as a [`Duration`].
    #[must_use]
    pub const fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

/// Splits a comma-separated list, trimming blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(
            split_list(" http://localhost:5173 , ,https://example.app"),
            vec![
                "http://localhost:5173".to_string(),
                "https://example.app".to_string()
            ]
        );
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        assert_eq!(parse_env("MARKET_TEST_SURELY_UNSET_KEY", 7_u32), 7);
        assert!(parse_env_bool("MARKET_TEST_SURELY_UNSET_KEY", true));
    }
}
