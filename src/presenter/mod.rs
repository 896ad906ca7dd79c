//! Client-side presentation of a result set: ordering, paging, selection, display text.

pub mod format;
pub mod pagination;
pub mod selection;
pub mod sort;


pub use format::{format_in, format_local, format_timestamp, make_snippet, preview, snippet};
pub use pagination::{Paginator, ResultPage, total_pages};
pub use selection::Selection;
pub use sort::arrange;
