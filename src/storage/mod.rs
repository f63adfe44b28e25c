//! Data access for players, games, ratings and restrictions.
//!
//! - `DataSource`: the query surface the stats engine consumes
//! - `MemoryDataSource`: in-memory implementation, optionally backed by
//!   JSONL files under the data directory
//! - JSONL reader/writer used for that backing

mod jsonl;
mod memory;

pub use jsonl::*;
pub use memory::*;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Game, Player, PlayerId, Rating, Restriction, Stats};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn path_for(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Persistent collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Games,
    Ratings,
    Restrictions,
}

impl Collection {
    /// Get the filename for this collection.
    pub fn filename(&self) -> &'static str {
        match self {
            Collection::Users => "users.jsonl",
            Collection::Games => "games.jsonl",
            Collection::Ratings => "ratings.jsonl",
            Collection::Restrictions => "restrictions.jsonl",
        }
    }
}

/// Query surface over the document store.
///
/// Each method is an independent read; a caller issuing several of them
/// gets no snapshot guarantee across calls.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn find_user(&self, id: &PlayerId) -> Result<Option<Player>, StorageError>;

    async fn find_user_by_alias(&self, alias: &str) -> Result<Option<Player>, StorageError>;

    async fn find_user_by_platform_id(
        &self,
        platform_id: &str,
    ) -> Result<Option<Player>, StorageError>;

    async fn find_all_users(&self) -> Result<Vec<Player>, StorageError>;

    /// Replace the player's stats wholesale. Either the new value is stored
    /// or the old one is left untouched.
    async fn save_player_stats(&self, id: &PlayerId, stats: &Stats) -> Result<(), StorageError>;

    /// Completed games the player captained.
    async fn count_completed_games_as_captain(&self, id: &PlayerId) -> Result<u32, StorageError>;

    /// Completed games whose composition lists the player.
    async fn count_completed_games_as_roster(&self, id: &PlayerId) -> Result<u32, StorageError>;

    /// Completed, scored games the player captained.
    async fn find_completed_games_as_captain(
        &self,
        id: &PlayerId,
    ) -> Result<Vec<Game>, StorageError>;

    /// Completed, scored games whose composition lists the player.
    async fn find_completed_games_as_roster(
        &self,
        id: &PlayerId,
    ) -> Result<Vec<Game>, StorageError>;

    /// Games of any status the player captained.
    async fn count_games_as_captain(&self, id: &PlayerId) -> Result<u32, StorageError>;

    /// Games with a `playerPick` choice naming the player.
    async fn count_games_where_picked(&self, id: &PlayerId) -> Result<u32, StorageError>;

    async fn find_games_where_picked(&self, id: &PlayerId) -> Result<Vec<Game>, StorageError>;

    /// Games with the player in the draft pool but neither picked nor captain.
    async fn count_games_in_pool_undrafted(&self, id: &PlayerId) -> Result<u32, StorageError>;

    async fn count_games_by_role(&self, role: &str, id: &PlayerId) -> Result<u32, StorageError>;

    /// Games with the player on a roster without being picked or captain.
    async fn count_substituted_in(&self, id: &PlayerId) -> Result<u32, StorageError>;

    /// Games with a slot entry for the player flagged as replaced.
    async fn count_substituted_out(&self, id: &PlayerId) -> Result<u32, StorageError>;

    async fn latest_rating(&self, id: &PlayerId) -> Result<Option<Rating>, StorageError>;

    async fn all_ratings(&self, id: &PlayerId) -> Result<Vec<Rating>, StorageError>;

    /// Launching, live and completed games the player captained or played
    /// in, newest first.
    async fn find_player_history_games(&self, id: &PlayerId) -> Result<Vec<Game>, StorageError>;

    async fn find_restrictions(&self, id: &PlayerId) -> Result<Vec<Restriction>, StorageError>;
}
