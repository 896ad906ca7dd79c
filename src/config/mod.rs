//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `QUILL_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_DEBOUNCE_MS, DEFAULT_FULL_TEXT_STALE_SECS,
    DEFAULT_MAX_POLL_FAILURES, DEFAULT_MAX_UNMEASURED_POLLS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_RECORD_STALE_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SEARCH_STALE_SECS,
};

/// Default backend URL used when `QUILL_API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Client configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `QUILL_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend origin, without the `/api` prefix. Default: `http://localhost:8000`.
    pub api_base_url: String,

    /// Per-request HTTP timeout. Default: 30 s.
    pub request_timeout: Duration,

    /// Search box debounce quiet period. Default: 300 ms.
    pub debounce: Duration,

    /// Freshness of semantic/hybrid search responses. Default: 60 s.
    pub search_stale_after: Duration,

    /// Freshness of full-text search responses. Default: 5 min.
    pub full_text_stale_after: Duration,

    /// Freshness of memo records and category/tag listings. Default: 5 min.
    pub record_stale_after: Duration,

    /// Progress poll cadence. Default: 1000 ms.
    pub poll_interval: Duration,

    /// Consecutive failed polls before the job is marked failed. Default: 3.
    pub max_poll_failures: u32,

    /// Consecutive `0/0` progress readings before the job is treated as empty. Default: 30.
    pub max_unmeasured_polls: u32,

    /// Max entries in the session cache. Default: 1024.
    pub cache_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            search_stale_after: Duration::from_secs(DEFAULT_SEARCH_STALE_SECS),
            full_text_stale_after: Duration::from_secs(DEFAULT_FULL_TEXT_STALE_SECS),
            record_stale_after: Duration::from_secs(DEFAULT_RECORD_STALE_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_poll_failures: DEFAULT_MAX_POLL_FAILURES,
            max_unmeasured_polls: DEFAULT_MAX_UNMEASURED_POLLS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl Config {
    const ENV_API_BASE_URL: &'static str = "QUILL_API_BASE_URL";
    const ENV_REQUEST_TIMEOUT_SECS: &'static str = "QUILL_REQUEST_TIMEOUT_SECS";
    const ENV_DEBOUNCE_MS: &'static str = "QUILL_DEBOUNCE_MS";
    const ENV_SEARCH_STALE_SECS: &'static str = "QUILL_SEARCH_STALE_SECS";
    const ENV_FULL_TEXT_STALE_SECS: &'static str = "QUILL_FULL_TEXT_STALE_SECS";
    const ENV_RECORD_STALE_SECS: &'static str = "QUILL_RECORD_STALE_SECS";
    const ENV_POLL_INTERVAL_MS: &'static str = "QUILL_POLL_INTERVAL_MS";
    const ENV_MAX_POLL_FAILURES: &'static str = "QUILL_MAX_POLL_FAILURES";
    const ENV_MAX_UNMEASURED_POLLS: &'static str = "QUILL_MAX_UNMEASURED_POLLS";
    const ENV_CACHE_CAPACITY: &'static str = "QUILL_CACHE_CAPACITY";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base_url = Self::parse_string_from_env(Self::ENV_API_BASE_URL, defaults.api_base_url);
        let request_timeout = Self::parse_secs_from_env(
            Self::ENV_REQUEST_TIMEOUT_SECS,
            defaults.request_timeout,
        )?;
        let debounce = Self::parse_millis_from_env(Self::ENV_DEBOUNCE_MS, defaults.debounce)?;
        let search_stale_after =
            Self::parse_secs_from_env(Self::ENV_SEARCH_STALE_SECS, defaults.search_stale_after)?;
        let full_text_stale_after = Self::parse_secs_from_env(
            Self::ENV_FULL_TEXT_STALE_SECS,
            defaults.full_text_stale_after,
        )?;
        let record_stale_after =
            Self::parse_secs_from_env(Self::ENV_RECORD_STALE_SECS, defaults.record_stale_after)?;
        let poll_interval =
            Self::parse_millis_from_env(Self::ENV_POLL_INTERVAL_MS, defaults.poll_interval)?;
        let max_poll_failures =
            Self::parse_u32_from_env(Self::ENV_MAX_POLL_FAILURES, defaults.max_poll_failures)?;
        let max_unmeasured_polls = Self::parse_u32_from_env(
            Self::ENV_MAX_UNMEASURED_POLLS,
            defaults.max_unmeasured_polls,
        )?;
        let cache_capacity =
            Self::parse_u64_from_env(Self::ENV_CACHE_CAPACITY, defaults.cache_capacity)?;

        Ok(Self {
            api_base_url,
            request_timeout,
            debounce,
            search_stale_after,
            full_text_stale_after,
            record_stale_after,
            poll_interval,
            max_poll_failures,
            max_unmeasured_polls,
            cache_capacity,
        })
    }

    /// Validates basic invariants.
    ///
    /// The debounce and staleness windows may be zero (no delay / always stale); the poll
    /// interval, request timeout and limits may not.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl {
                value: self.api_base_url.clone(),
            });
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_POLL_INTERVAL_MS,
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_REQUEST_TIMEOUT_SECS,
            });
        }
        if self.max_poll_failures == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_MAX_POLL_FAILURES,
            });
        }
        if self.max_unmeasured_polls == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_MAX_UNMEASURED_POLLS,
            });
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_CACHE_CAPACITY,
            });
        }

        Ok(())
    }

    /// Returns the `/api` root for request URLs (`{base}/api`, trailing slashes removed).
    pub fn api_root(&self) -> String {
        format!("{}/api", self.api_base_url.trim().trim_end_matches('/'))
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_u64_from_env(name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidNumber {
                    name,
                    value: value.clone(),
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_u32_from_env(name: &'static str, default: u32) -> Result<u32, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidNumber {
                    name,
                    value: value.clone(),
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_secs_from_env(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        Self::parse_u64_from_env(name, default.as_secs()).map(Duration::from_secs)
    }

    fn parse_millis_from_env(
        name: &'static str,
        default: Duration,
    ) -> Result<Duration, ConfigError> {
        Self::parse_u64_from_env(name, default.as_millis() as u64).map(Duration::from_millis)
    }
}
