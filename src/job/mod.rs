//! Indexing ("vectorize") job tracker.
//!
//! `Idle → Starting → Polling → Complete | Failed`. A single poll task per polling
//! session fetches progress live, one request at a time, and stops as soon as the job
//! is known complete.

pub mod config;
pub mod error;
pub mod tracker;
pub mod types;


pub use config::JobConfig;
pub use error::{JobError, JobResult};
pub use tracker::JobTracker;
pub use types::{JobSnapshot, JobState, StartOutcome};
