use std::time::Duration;

use super::mode::SearchMode;
use crate::config::Config;
use crate::constants::{DEFAULT_DEBOUNCE_MS, DEFAULT_FULL_TEXT_STALE_SECS, DEFAULT_SEARCH_STALE_SECS};

/// Timing knobs of the search orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Quiet period before typed text becomes the effective query.
    pub debounce: Duration,
    /// Freshness of semantic and hybrid responses.
    pub stale_after: Duration,
    /// Freshness of full-text responses.
    pub full_text_stale_after: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            stale_after: Duration::from_secs(DEFAULT_SEARCH_STALE_SECS),
            full_text_stale_after: Duration::from_secs(DEFAULT_FULL_TEXT_STALE_SECS),
        }
    }
}

impl SearchConfig {
    /// Returns the freshness window for responses in `mode`.
    #[inline]
    pub fn stale_after_for(&self, mode: SearchMode) -> Duration {
        match mode {
            SearchMode::FullText => self.full_text_stale_after,
            SearchMode::Semantic | SearchMode::Hybrid => self.stale_after,
        }
    }
}

impl From<&Config> for SearchConfig {
    fn from(config: &Config) -> Self {
        Self {
            debounce: config.debounce,
            stale_after: config.search_stale_after,
            full_text_stale_after: config.full_text_stale_after,
        }
    }
}
