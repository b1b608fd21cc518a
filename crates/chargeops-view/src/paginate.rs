//! Client-side pagination

use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

/// Pagination errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// Requested page is outside `1..=page_count`
    #[error("page {requested} is out of range (1..={page_count})")]
    OutOfRange {
        /// Page asked for
        requested: usize,
        /// Pages available
        page_count: usize,
    },
}

/// Number of pages needed for `len` items; never less than one
#[must_use]
pub const fn page_count(len: usize, page_size: usize) -> usize {
    let size = if page_size == 0 { 1 } else { page_size };
    let pages = len.div_ceil(size);
    if pages == 0 { 1 } else { pages }
}

/// Current page over a fixed page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page: usize,
    page_size: usize,
}

impl Paginator {
    /// Start on page 1; a zero page size is treated as one
    #[must_use]
    pub const fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: if page_size == 0 { 1 } else { page_size },
        }
    }

    /// Current page (1-based)
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Items per page
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Jump to page `n` of a list of `len` items
    ///
    /// # Errors
    ///
    /// Returns [`PageError::OutOfRange`] and leaves the page unchanged when
    /// `n` is 0 or past the last page.
    pub const fn go_to(&mut self, n: usize, len: usize) -> Result<(), PageError> {
        let pages = page_count(len, self.page_size);
        if n == 0 || n > pages {
            return Err(PageError::OutOfRange {
                requested: n,
                page_count: pages,
            });
        }
        self.page = n;
        Ok(())
    }

    /// Advance one page; `false` on the last page
    pub const fn next(&mut self, len: usize) -> bool {
        if self.page < page_count(len, self.page_size) {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page; `false` on the first page
    pub const fn prev(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Back to page 1
    pub const fn reset(&mut self) {
        self.page = 1;
    }

    /// Pull the page down after the list shrank to `len` items
    pub const fn clamp(&mut self, len: usize) {
        let pages = page_count(len, self.page_size);
        if self.page > pages {
            self.page = pages;
        }
    }

    /// Index range of the current page in a list of `len` items
    #[must_use]
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = (self.page - 1).saturating_mul(self.page_size).min(len);
        let end = start.saturating_add(self.page_size).min(len);
        start..end
    }

    /// The current page of `items`
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }

    /// Rendering metadata for a list of `len` items
    #[must_use]
    pub fn info(&self, len: usize) -> PageInfo {
        let total_pages = page_count(len, self.page_size);
        let range = self.range(len);
        let has_next = self.page < total_pages;
        let has_prev = self.page > 1;

        PageInfo {
            page: self.page,
            per_page: self.page_size,
            total: len,
            total_pages,
            has_next,
            has_prev,
            next_page: has_next.then_some(self.page + 1),
            prev_page: has_prev.then(|| self.page - 1),
            first_item: if range.is_empty() { 0 } else { range.start + 1 },
            last_item: range.end,
        }
    }
}

/// Pagination metadata for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Current page (1-based)
    pub page: usize,

    /// Items per page
    pub per_page: usize,

    /// Total number of items
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there's a next page
    pub has_next: bool,

    /// Whether there's a previous page
    pub has_prev: bool,

    /// Next page number (if exists)
    pub next_page: Option<usize>,

    /// Previous page number (if exists)
    pub prev_page: Option<usize>,

    /// 1-based index of the first item shown; 0 when empty
    pub first_item: usize,

    /// 1-based index of the last item shown; 0 when empty
    pub last_item: usize,
}
