//! Search orchestration: debounced input, cache-first dispatch, supersession.

pub mod config;
pub mod error;
pub mod mode;
pub mod orchestrator;
pub mod types;


pub use config::SearchConfig;
pub use error::{SearchError, SearchResultSet};
pub use mode::SearchMode;
pub use orchestrator::SearchOrchestrator;
pub use types::{Query, SearchSnapshot, SearchStatus};
