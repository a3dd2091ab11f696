//! Pagination primitives shared by every list surface.

use serde::{Deserialize, Serialize};

/// A validated page request. Pages are 1-based.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    pub const MAX_PER_PAGE: u32 = 100;

    /// Build a request from raw (possibly absent or nonsense) query values.
    ///
    /// Zero or missing values fall back to page 1 and the surface's default
    /// page size; oversized page sizes clamp to [`Self::MAX_PER_PAGE`].
    pub fn clamped(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p,
            _ => 1,
        };
        let per_page = match per_page {
            Some(n) if n >= 1 => n.min(Self::MAX_PER_PAGE),
            _ => default_per_page.min(Self::MAX_PER_PAGE),
        };
        Self { page, per_page }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Row offset for SQL `OFFSET` / slice skipping.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// One page of results plus enough metadata to page further.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            page_size: request.per_page(),
        }
    }

    /// Convert item types while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Listing<U> {
        Listing {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
