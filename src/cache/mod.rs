//! Cache invalidation coordinator.
//!
//! One [`QueryCache`] is shared by the search orchestrator, the job tracker and the
//! session's memo reads. Mutations invalidate keys or whole [`KeyScope`]s; reads report
//! [`CacheRead::Fresh`], [`CacheRead::Stale`] or [`CacheRead::Missing`] and never block.

pub mod key;
pub mod store;
pub mod types;


pub use key::{CacheKey, KeyScope};
pub use store::{QueryCache, SharedCache};
pub use types::{CacheEntry, CacheRead, CacheValue, CachedValue, FetchTicket};
