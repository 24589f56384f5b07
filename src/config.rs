//! Tracker configuration from environment variables

use std::env;
use std::time::Duration;

/// Configuration for a tracker run
///
/// Loaded from environment variables with deployment defaults. The URLs and
/// page size are fixed constants of a given deployment; everything else is a
/// tuning knob.
#[derive(Debug, Clone)]
pub struct Config {
    /// Registry endpoint returning the tracked accounts
    pub registry_url: String,

    /// Trade feed endpoint base (account_id/limit/cursor appended as query)
    pub feed_url: String,

    /// Rows requested per feed page
    pub page_size: usize,

    /// Path of the cumulative checkpoint document
    pub state_path: String,

    /// Directory holding the per-date daily snapshot documents
    pub daily_dir: String,

    /// Persist both stores every N processed accounts
    pub persist_every: usize,

    /// Delay between feed requests (accounts and pages)
    pub request_delay: Duration,

    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `VOLFLOW_REGISTRY_URL`
    /// - `VOLFLOW_FEED_URL`
    /// - `VOLFLOW_PAGE_SIZE` (default: 1000)
    /// - `VOLFLOW_STATE_PATH` (default: spot_vol_data.json)
    /// - `VOLFLOW_DAILY_DIR` (default: .)
    /// - `VOLFLOW_PERSIST_EVERY` (default: 50)
    /// - `VOLFLOW_REQUEST_DELAY_MS` (default: 250)
    /// - `VOLFLOW_HTTP_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Self {
        Self {
            registry_url: env::var("VOLFLOW_REGISTRY_URL").unwrap_or_else(|_| {
                "https://raw.githubusercontent.com/Eliasdegemu61/Sodex-Tracker-new-v1/main/registry.json"
                    .to_string()
            }),

            feed_url: env::var("VOLFLOW_FEED_URL").unwrap_or_else(|_| {
                "https://mainnet-data.sodex.dev/api/v1/spot/trades".to_string()
            }),

            page_size: env::var("VOLFLOW_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1_000),

            state_path: env::var("VOLFLOW_STATE_PATH")
                .unwrap_or_else(|_| "spot_vol_data.json".to_string()),

            daily_dir: env::var("VOLFLOW_DAILY_DIR").unwrap_or_else(|_| ".".to_string()),

            persist_every: env::var("VOLFLOW_PERSIST_EVERY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50),

            request_delay: Duration::from_millis(
                env::var("VOLFLOW_REQUEST_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(250),
            ),

            http_timeout: Duration::from_secs(
                env::var("VOLFLOW_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Defaults and overrides share one test: the variables are process-wide
    // and the test harness runs in parallel.
    #[test]
    fn test_config_defaults_and_overrides() {
        env::remove_var("VOLFLOW_PAGE_SIZE");
        env::remove_var("VOLFLOW_STATE_PATH");
        env::remove_var("VOLFLOW_PERSIST_EVERY");
        env::remove_var("VOLFLOW_REQUEST_DELAY_MS");

        let config = Config::from_env();
        assert_eq!(config.page_size, 1_000);
        assert_eq!(config.state_path, "spot_vol_data.json");
        assert_eq!(config.persist_every, 50);
        assert_eq!(config.request_delay, Duration::from_millis(250));
        assert_eq!(config.http_timeout, Duration::from_secs(10));

        env::set_var("VOLFLOW_PAGE_SIZE", "200");
        env::set_var("VOLFLOW_STATE_PATH", "/tmp/vol_state.json");
        env::set_var("VOLFLOW_PERSIST_EVERY", "10");
        env::set_var("VOLFLOW_REQUEST_DELAY_MS", "50");

        let config = Config::from_env();
        assert_eq!(config.page_size, 200);
        assert_eq!(config.state_path, "/tmp/vol_state.json");
        assert_eq!(config.persist_every, 10);
        assert_eq!(config.request_delay, Duration::from_millis(50));

        // Unparsable values fall back to defaults
        env::set_var("VOLFLOW_PAGE_SIZE", "not-a-number");
        let config = Config::from_env();
        assert_eq!(config.page_size, 1_000);

        env::remove_var("VOLFLOW_PAGE_SIZE");
        env::remove_var("VOLFLOW_STATE_PATH");
        env::remove_var("VOLFLOW_PERSIST_EVERY");
        env::remove_var("VOLFLOW_REQUEST_DELAY_MS");
    }
}
