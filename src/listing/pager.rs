//! Bounded pagination.
//!
//! Counting a large filtered listing exactly costs a full scan on every
//! request. The pager instead counts at most `3 * limit + 1` rows past the
//! page offset and reports the total as "many" once that cap is reached.
use serde::{Serialize, Serializer};
use std::convert::Infallible;

/// Total row count of a listing: exact, or "at least offset + 3L + 1".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTotal {
    Exact(u64),
    Many,
}

impl Serialize for PageTotal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Exact(n) => serializer.serialize_u64(*n),
            Self::Many => serializer.serialize_str("many"),
        }
    }
}

/// Page index plus the page size configured for the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    /// A zero page size is bumped to one.
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.limit)
    }

    /// Number of rows counted past the offset before giving up on an exact total.
    pub fn count_cap(&self) -> u64 {
        self.limit.saturating_mul(3).saturating_add(1)
    }
}

/// One page of a listing.
///
/// `next_page` is 0 when there is no next page; 0 is also a valid page
/// index, so `has_next_page` is the authoritative signal.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total_count: PageTotal,
    pub current_page: u64,
    pub next_page: u64,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    /// Build the page from the rows fetched at the offset and the cropped count.
    pub fn assemble(window: PageWindow, rows: Vec<T>, cropped_count: u64) -> Self {
        let offset = window.offset();
        let total_count = if cropped_count >= window.count_cap() {
            PageTotal::Many
        } else {
            PageTotal::Exact(offset.saturating_add(cropped_count))
        };

        let has_next_page = match total_count {
            PageTotal::Many => true,
            PageTotal::Exact(total) => total > offset.saturating_add(window.limit),
        };

        Self {
            rows,
            total_count,
            current_page: window.page,
            next_page: if has_next_page { window.page + 1 } else { 0 },
            has_next_page,
        }
    }
}

/// A filtered, ordered row set that can be counted and read by window.
pub trait WindowSource {
    type Row;
    type Error;

    /// Count rows starting at `offset`, stopping once `cap` rows have been seen.
    fn count_window(&self, offset: u64, cap: u64) -> Result<u64, Self::Error>;

    /// Read up to `limit` rows starting at `offset`.
    fn fetch_window(&self, offset: u64, limit: u64) -> Result<Vec<Self::Row>, Self::Error>;
}

/// Compute one page of `source`.
pub fn paginate<S>(source: &S, window: PageWindow) -> Result<Page<S::Row>, S::Error>
where
    S: WindowSource + ?Sized,
{
    let offset = window.offset();
    let cropped = source.count_window(offset, window.count_cap())?;
    let rows = if cropped == 0 {
        Vec::new()
    } else {
        source.fetch_window(offset, window.limit)?
    };
    Ok(Page::assemble(window, rows, cropped))
}

impl<T: Clone> WindowSource for [T] {
    type Row = T;
    type Error = Infallible;

    fn count_window(&self, offset: u64, cap: u64) -> Result<u64, Self::Error> {
        let remaining = (self.len() as u64).saturating_sub(offset);
        Ok(remaining.min(cap))
    }

    fn fetch_window(&self, offset: u64, limit: u64) -> Result<Vec<T>, Self::Error> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.len());
        let end = usize::try_from(offset.saturating_add(limit))
            .unwrap_or(usize::MAX)
            .min(self.len());
        Ok(self[start..end].to_vec())
    }
}
