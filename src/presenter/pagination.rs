use crate::constants::PAGE_SIZE;

/// `max(1, ceil(count / PAGE_SIZE))`.
#[inline]
pub fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE).max(1)
}

/// One page of an ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultPage<'a, T> {
    pub items: &'a [T],
    /// 1-based page number.
    pub page: usize,
    pub total_pages: usize,
    /// Offset of `items[0]` in the full sequence.
    pub start: usize,
    /// Length of the full sequence.
    pub total: usize,
}

impl<T> ResultPage<'_, T> {
    #[inline]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[inline]
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Fixed-size pagination cursor. The page is always kept within `[1, total_pages]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new()
    }
}

impl Paginator {
    pub const fn new() -> Self {
        Self { page: 1 }
    }

    #[inline]
    pub fn page(&self) -> usize {
        self.page
    }

    /// Back to page 1. Called whenever a search is explicitly submitted.
    #[inline]
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Advances one page; a no-op on the last page.
    pub fn next(&mut self, count: usize) -> usize {
        self.clamp(count);
        if self.page < total_pages(count) {
            self.page += 1;
        }
        self.page
    }

    /// Goes back one page; a no-op on page 1.
    pub fn prev(&mut self, count: usize) -> usize {
        self.clamp(count);
        if self.page > 1 {
            self.page -= 1;
        }
        self.page
    }

    /// Jumps to `page`, clamped into range.
    pub fn go_to(&mut self, page: usize, count: usize) -> usize {
        self.page = page.clamp(1, total_pages(count));
        self.page
    }

    /// Re-clamps after the result count changed.
    #[inline]
    pub fn clamp(&mut self, count: usize) {
        self.page = self.page.clamp(1, total_pages(count));
    }

    /// Returns the current page of `items`.
    pub fn window<'a, T>(&self, items: &'a [T]) -> ResultPage<'a, T> {
        let total_pages = total_pages(items.len());
        let page = self.page.clamp(1, total_pages);
        let start = ((page - 1) * PAGE_SIZE).min(items.len());
        let end = (start + PAGE_SIZE).min(items.len());

        ResultPage {
            items: &items[start..end],
            page,
            total_pages,
            start,
            total: items.len(),
        }
    }
}
