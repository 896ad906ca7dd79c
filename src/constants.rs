//! Cross-cutting, shared constants.
//!
//! Durations are the defaults used by [`crate::config::Config`]; runtime code reads them
//! through the config so they can be overridden per session.

use std::time::Duration;

/// Results per page in the result presenter.
pub const PAGE_SIZE: usize = 10;

/// Default debounce quiet period for the search box.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Freshness window for semantic and hybrid search responses.
pub const DEFAULT_SEARCH_STALE_SECS: u64 = 60;

/// Freshness window for full-text search responses.
pub const DEFAULT_FULL_TEXT_STALE_SECS: u64 = 5 * 60;

/// Freshness window for memo records and category/tag listings.
pub const DEFAULT_RECORD_STALE_SECS: u64 = 5 * 60;

/// Progress poll cadence while an indexing job is running.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Consecutive failed progress polls tolerated before the job is marked failed.
pub const DEFAULT_MAX_POLL_FAILURES: u32 = 3;

/// Consecutive `total == 0` progress readings tolerated before the job is treated as empty.
pub const DEFAULT_MAX_UNMEASURED_POLLS: u32 = 30;

/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Max entries held by the session cache.
pub const DEFAULT_CACHE_CAPACITY: u64 = 1_024;

/// Characters shown in a result-list body preview.
pub const PREVIEW_CHARS: usize = 200;

/// Characters kept by [`crate::presenter::snippet`].
pub const DEFAULT_SNIPPET_CHARS: usize = 100;

/// Display pattern for memo timestamps.
pub const DEFAULT_TIMESTAMP_PATTERN: &str = "yyyy/MM/dd HH:mm:ss";

/// The progress key never serves cached values while polling; this threshold applies only
/// to non-polling reads (e.g. a UI rendering the last known progress).
pub const PROGRESS_STALE_AFTER: Duration = Duration::ZERO;
