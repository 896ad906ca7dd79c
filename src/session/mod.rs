//! Session composition root.
//!
//! A [`Session`] owns the cache and wires it into the search slot, the job tracker and
//! the memo reads. Memo writes go through the session so dependent keys are invalidated:
//! create marks every search and the category/tag listings stale; update and delete
//! also mark the memo's own key stale.

pub mod handle;
pub mod error;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{SessionError, SessionResult};
pub use handle::Session;
pub use types::{Backend, PageView};
