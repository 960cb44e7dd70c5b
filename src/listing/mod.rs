//! Listing engine: filter predicates, orderings and bounded pagination.
//!
//! A listing request is a list of [`Predicate`]s, an [`OrderBy`] and a page
//! index. The store folds them into one query; [`pager::paginate`] turns the
//! result into a [`Page`].
pub mod filter;
pub mod order;
pub mod pager;
pub mod params;

pub use filter::{Column, Predicate, compose_where};
pub use order::{Direction, MemberSort, OrderBy, SortKey, StructSort, UseSort};
pub use pager::{Page, PageTotal, PageWindow, WindowSource, paginate};
pub use params::ListingParams;

/// A validated listing request for a listing sorted by `K`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest<K: SortKey> {
    pub predicates: Vec<Predicate>,
    pub sort: K,
    pub direction: Direction,
    pub page: u64,
}

impl<K: SortKey> Default for ListingRequest<K> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            sort: K::default(),
            direction: Direction::Asc,
            page: 0,
        }
    }
}

impl<K: SortKey> ListingRequest<K> {
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn sorted(mut self, sort: K, direction: Direction) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn order_by(&self) -> OrderBy {
        OrderBy::resolve(self.sort, self.direction)
    }
}
