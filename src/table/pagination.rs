use tracing::debug;

use crate::fetch::FetchResponse;

/// Client-mode page window over the filtered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPager {
    pub page: usize,
    pub page_size: usize,
}

impl ClientPager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// An empty set still presents one (empty) page.
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Arbitrary jump, bounded to the valid page range.
    pub fn set_page(&mut self, page: usize, total: usize) {
        self.page = page.clamp(1, self.page_count(total));
    }

    pub fn first(&mut self) {
        self.page = 1;
    }

    pub fn prev(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn next(&mut self, total: usize) {
        self.page = (self.page + 1).min(self.page_count(total));
    }

    pub fn last(&mut self, total: usize) {
        self.page = self.page_count(total);
    }

    /// Size changes restart from the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Zero-based half-open slice bounds into the filtered set.
    pub fn slice_bounds(&self, total: usize) -> (usize, usize) {
        let start = ((self.page - 1) * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        (start, end)
    }
}

/// Cursor-mode token state, mirroring whatever the last fetch
/// returned. Page numbers are a position indicator only; the total
/// page count is unknowable without full enumeration, so there is no
/// jump or last here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorPager {
    pub cursor: Option<String>,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
    pub has_next: bool,
    pub has_prev: bool,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl CursorPager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Take the paging tokens from a completed fetch.
    pub fn absorb(&mut self, response: &FetchResponse) {
        self.next_cursor = response.next_cursor.clone();
        self.prev_cursor = response.prev_cursor.clone();
        self.has_next = response.has_next;
        self.has_prev = response.has_prev;
        self.total = response.total;
        debug!(
            target: "fetch",
            "page tokens absorbed: next={:?} prev={:?} total={}",
            self.next_cursor, self.prev_cursor, self.total
        );
    }

    /// Back to the first page: cursor = none, tokens dropped.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.next_cursor = None;
        self.prev_cursor = None;
        self.has_next = false;
        self.has_prev = false;
        self.page = 1;
    }
}

/// The two mutually exclusive paging strategies, decided once at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMode {
    Client(ClientPager),
    Cursor(CursorPager),
}

impl PageMode {
    pub fn is_cursor(&self) -> bool {
        matches!(self, PageMode::Cursor(_))
    }

    pub fn page(&self) -> usize {
        match self {
            PageMode::Client(pager) => pager.page,
            PageMode::Cursor(pager) => pager.page,
        }
    }

    pub fn page_size(&self) -> usize {
        match self {
            PageMode::Client(pager) => pager.page_size,
            PageMode::Cursor(pager) => pager.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_bounds_window_the_filtered_set() {
        let mut pager = ClientPager::new(2);
        pager.set_page(2, 5);
        // zero-based indices [2, 3] of a 5-row set
        assert_eq!(pager.slice_bounds(5), (2, 4));

        pager.last(5);
        assert_eq!(pager.page, 3);
        assert_eq!(pager.slice_bounds(5), (4, 5));
    }

    #[test]
    fn page_jump_is_bounded() {
        let mut pager = ClientPager::new(10);
        pager.set_page(99, 25);
        assert_eq!(pager.page, 3);
        pager.set_page(0, 25);
        assert_eq!(pager.page, 1);
    }

    #[test]
    fn empty_set_has_one_empty_page() {
        let pager = ClientPager::new(10);
        assert_eq!(pager.page_count(0), 1);
        assert_eq!(pager.slice_bounds(0), (0, 0));
    }

    #[test]
    fn size_change_restarts_from_first_page() {
        let mut pager = ClientPager::new(2);
        pager.set_page(3, 10);
        pager.set_page_size(5);
        assert_eq!(pager.page, 1);
        assert_eq!(pager.page_size, 5);
    }

    #[test]
    fn cursor_reset_drops_every_token() {
        let mut pager = CursorPager::new(10);
        pager.absorb(&FetchResponse {
            next_cursor: Some("n".to_string()),
            prev_cursor: Some("p".to_string()),
            has_next: true,
            has_prev: true,
            total: 40,
            ..FetchResponse::default()
        });
        pager.page = 3;

        pager.reset();
        assert_eq!(pager.page, 1);
        assert_eq!(pager.next_cursor, None);
        assert!(!pager.has_next);
        // totals are re-learned from the next fetch
        assert_eq!(pager.total, 40);
    }
}
