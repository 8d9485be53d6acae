//! Page-number pagination shared by every feed.
//!
//! Requests name a page by number; the paginator resolves it against the
//! total item count to a valid page and a `PageWindow` for the store query.

use std::num::NonZeroU32;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Page number as supplied by the client, before resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    number: Option<i64>,
}

impl PageRequest {
    pub fn first() -> Self {
        Self { number: None }
    }

    pub fn number(number: i64) -> Self {
        Self {
            number: Some(number),
        }
    }

    /// Parse the raw `page` query value. Anything that is not an integer
    /// means the first page.
    pub fn parse(raw: Option<&str>) -> Self {
        Self {
            number: raw.and_then(|value| value.trim().parse::<i64>().ok()),
        }
    }

    pub fn requested(&self) -> Option<i64> {
        self.number
    }
}

/// Offset/limit pair handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u32,
}

/// A resolved page: which page it is and where it sits in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub number: u64,
    pub num_pages: u64,
    pub total_count: u64,
    pub window: PageWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: NonZeroU32,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            per_page: NonZeroU32::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl Paginator {
    pub fn new(per_page: NonZeroU32) -> Self {
        Self { per_page }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.get()
    }

    /// Number of pages for `total` items. An empty collection still has one page.
    pub fn num_pages(&self, total: u64) -> u64 {
        let per_page = u64::from(self.per_page.get());
        total.div_ceil(per_page).max(1)
    }

    /// Resolve a request to the nearest valid page.
    pub fn plan(&self, request: PageRequest, total: u64) -> PagePlan {
        let num_pages = self.num_pages(total);
        let number = match request.requested() {
            None => 1,
            Some(value) if value < 1 => 1,
            Some(value) => (value as u64).min(num_pages),
        };
        let per_page = self.per_page.get();

        PagePlan {
            number,
            num_pages,
            total_count: total,
            window: PageWindow {
                offset: (number - 1) * u64::from(per_page),
                limit: per_page,
            },
        }
    }
}

/// A page of items plus the navigation facts templates need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, plan: PagePlan) -> Self {
        Self {
            items,
            number: plan.number,
            num_pages: plan.num_pages,
            total_count: plan.total_count,
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total_count: self.total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginator(size: u32) -> Paginator {
        Paginator::new(NonZeroU32::new(size).expect("non-zero"))
    }

    #[test]
    fn parse_accepts_integers_only() {
        assert_eq!(PageRequest::parse(Some("3")).requested(), Some(3));
        assert_eq!(PageRequest::parse(Some(" 2 ")).requested(), Some(2));
        assert_eq!(PageRequest::parse(Some("abc")).requested(), None);
        assert_eq!(PageRequest::parse(Some("")).requested(), None);
        assert_eq!(PageRequest::parse(None).requested(), None);
    }

    #[test]
    fn twenty_four_items_make_three_pages() {
        let paginator = paginator(10);
        assert_eq!(paginator.num_pages(24), 3);

        let last = paginator.plan(PageRequest::number(3), 24);
        assert_eq!(last.window, PageWindow { offset: 20, limit: 10 });
    }

    #[test]
    fn empty_collection_has_one_page() {
        let plan = paginator(10).plan(PageRequest::first(), 0);
        assert_eq!(plan.number, 1);
        assert_eq!(plan.num_pages, 1);
        assert_eq!(plan.window.offset, 0);
    }

    #[test]
    fn out_of_range_requests_resolve_to_nearest_page() {
        let paginator = paginator(10);
        assert_eq!(paginator.plan(PageRequest::number(0), 24).number, 1);
        assert_eq!(paginator.plan(PageRequest::number(-5), 24).number, 1);
        assert_eq!(paginator.plan(PageRequest::number(99), 24).number, 3);
        assert_eq!(paginator.plan(PageRequest::parse(Some("x")), 24).number, 1);
    }

    #[test]
    fn page_navigation_flags() {
        let paginator = paginator(10);
        let middle: Page<u8> = Page::new(Vec::new(), paginator.plan(PageRequest::number(2), 24));
        assert!(middle.has_next());
        assert!(middle.has_previous());
        assert_eq!(middle.next_number(), Some(3));
        assert_eq!(middle.previous_number(), Some(1));

        let only: Page<u8> = Page::new(Vec::new(), paginator.plan(PageRequest::first(), 4));
        assert!(!only.has_next());
        assert!(!only.has_previous());
    }
}
