use std::time::Duration;

use crate::config::Config;
use crate::constants::{
    DEFAULT_MAX_POLL_FAILURES, DEFAULT_MAX_UNMEASURED_POLLS, DEFAULT_POLL_INTERVAL_MS,
};

/// Polling policy of the job tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobConfig {
    /// Delay between the end of one progress fetch and the start of the next.
    pub poll_interval: Duration,
    /// Consecutive failed polls that fail the job.
    pub max_poll_failures: u32,
    /// Consecutive `total == 0` readings after which the job is treated as empty.
    pub max_unmeasured_polls: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_poll_failures: DEFAULT_MAX_POLL_FAILURES,
            max_unmeasured_polls: DEFAULT_MAX_UNMEASURED_POLLS,
        }
    }
}

impl From<&Config> for JobConfig {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval,
            max_poll_failures: config.max_poll_failures,
            max_unmeasured_polls: config.max_unmeasured_polls,
        }
    }
}
