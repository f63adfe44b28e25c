//! Player statistics maintenance.
//!
//! - `StatsAggregator`: recomputes a player's derived `Stats`
//! - `PlayerLocks`: one in-flight update per player
//! - `StatsUpdateCoordinator`: the entry points callers use; sequences
//!   recompute, persistence and cache maintenance

mod aggregator;
mod coordinator;
mod locks;

pub use aggregator::*;
pub use coordinator::*;
pub use locks::*;

use thiserror::Error;

use crate::cache::{CacheError, DebounceTiming};
use crate::storage::StorageError;

/// Errors surfaced by stats and projection operations.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Player (or page handle) does not resolve.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data source error: {0}")]
    DataSourceUnavailable(#[source] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl From<StorageError> for StatsError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => StatsError::NotFound(what),
            other => StatsError::DataSourceUnavailable(other),
        }
    }
}

/// Settings shared by the aggregator and the projections.
#[derive(Debug, Clone)]
pub struct StatsSettings {
    /// Role ids counted in `Stats::roles`, in display order
    pub roles: Vec<String>,

    /// Pick positions always present in the draft histogram
    pub draft_picks: u32,

    /// Omit ratings and scores from listings and pages
    pub hide_ratings: bool,

    /// Restriction duration labels shown on player pages
    pub restriction_durations: Vec<String>,

    pub list_debounce: DebounceTiming,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            roles: vec!["player".to_string()],
            draft_picks: 0,
            hide_ratings: false,
            restriction_durations: Vec::new(),
            list_debounce: DebounceTiming::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_not_found_maps_to_not_found() {
        let err: StatsError = StorageError::NotFound("player p1".to_string()).into();
        assert!(matches!(err, StatsError::NotFound(_)));

        let err: StatsError = StorageError::Unavailable("down".to_string()).into();
        assert!(matches!(err, StatsError::DataSourceUnavailable(_)));
        assert_eq!(err.to_string(), "Data source error: Data source unavailable: down");
    }
}
