/// Error types surfaced by listing and detail requests.
use thiserror::Error;

/// Errors a browse request can end with.
///
/// Malformed listing parameters never show up here: they are replaced by
/// their defaults when the request is parsed (see [`crate::listing::params`]).
#[derive(Error, Debug)]
pub enum BrowseError {
    /// A detail lookup by id matched no record.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// The record store could not be reached or a query failed.
    #[error("record store unavailable: {0}")]
    Store(#[from] rusqlite::Error),
}

impl BrowseError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T, E = BrowseError> = std::result::Result<T, E>;
