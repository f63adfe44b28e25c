//! Read-through caching of player projections.
//!
//! - `CacheStore`: key → serialized blob store (get/set/delete)
//! - `PlayerListProjector`: debounced "all players" / "active players" lists
//! - `PlayerPageCache`: lazily rebuilt per-player pages
//!
//! The store never recomputes anything itself; callers repopulate on miss.

mod debounce;
mod list;
mod page;

pub use debounce::*;
pub use list::*;
pub use page::*;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::PlayerId;

/// Errors that can occur talking to the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Cache entry names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    AllPlayerList,
    ActivePlayerList,
    PlayerPage(PlayerId),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::AllPlayerList => write!(f, "allPlayerList"),
            CacheKey::ActivePlayerList => write!(f, "activePlayerList"),
            CacheKey::PlayerPage(id) => write!(f, "playerPage-{}", id),
        }
    }
}

/// Key → opaque serialized value. Entries live until deleted or overwritten.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Write several entries so that no reader sees some of them updated
    /// and others not.
    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Process-local cache store.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<(), CacheError> {
        let mut map = self.entries.write().await;
        for (key, value) in entries {
            map.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Read and decode a cached value. A blob that no longer decodes is logged
/// and reported as a miss so the caller rebuilds it.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn CacheStore,
    key: &CacheKey,
) -> Result<Option<T>, CacheError> {
    let key = key.to_string();
    let Some(raw) = store.get(&key).await? else {
        debug!("Cache miss for {}", key);
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!("Malformed cache entry {}: {}", key, e);
            Ok(None)
        }
    }
}
