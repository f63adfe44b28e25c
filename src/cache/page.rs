//! Cached per-player pages.
//!
//! Each player has an invalidation generation. A build only stores its page
//! when the generation it started under is still current, so a page read
//! from data older than the last `invalidate` is returned to its caller but
//! never cached.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::{read_json, CacheError, CacheKey, CacheStore};
use crate::models::{PageGame, Player, PlayerId, PlayerPage, Restriction};
use crate::stats::StatsError;
use crate::storage::DataSource;

/// Builds player pages on demand and keeps them until invalidated.
pub struct PlayerPageCache {
    source: Arc<dyn DataSource>,
    cache: Arc<dyn CacheStore>,
    hide_ratings: bool,
    restriction_durations: Vec<String>,
    /// Bumped by every `invalidate`. One entry per player ever invalidated,
    /// so bounded by the player count.
    generations: Mutex<HashMap<PlayerId, u64>>,
}

impl PlayerPageCache {
    pub fn new(
        source: Arc<dyn DataSource>,
        cache: Arc<dyn CacheStore>,
        hide_ratings: bool,
        restriction_durations: Vec<String>,
    ) -> Self {
        Self {
            source,
            cache,
            hide_ratings,
            restriction_durations,
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// Look a player up by id, then alias, then platform id.
    async fn resolve(&self, handle: &str) -> Result<Option<Player>, StatsError> {
        if let Some(player) = self.source.find_user(&PlayerId::from(handle)).await? {
            return Ok(Some(player));
        }
        if let Some(player) = self.source.find_user_by_alias(handle).await? {
            return Ok(Some(player));
        }
        Ok(self.source.find_user_by_platform_id(handle).await?)
    }

    /// Page for a player id, alias or platform id.
    ///
    /// The player must still resolve even when a page is cached; a handle
    /// that matches nobody is `NotFound`.
    pub async fn get_page(&self, handle: &str) -> Result<PlayerPage, StatsError> {
        let id = self
            .resolve(handle)
            .await?
            .ok_or_else(|| StatsError::NotFound(format!("player {}", handle)))?
            .id;

        let generation = self.generation(&id).await;
        let key = CacheKey::PlayerPage(id.clone());
        if let Some(page) = read_json(self.cache.as_ref(), &key).await? {
            return Ok(page);
        }

        // Re-read so the profile and stats are no older than `generation`
        let player = self
            .source
            .find_user(&id)
            .await?
            .ok_or_else(|| StatsError::NotFound(format!("player {}", handle)))?;
        let page = self.build(player).await?;
        let json = serde_json::to_string(&page).map_err(CacheError::from)?;

        let generations = self.generations.lock().await;
        if generations.get(&id).copied().unwrap_or(0) == generation {
            self.cache.set(&key.to_string(), json).await?;
        } else {
            debug!("Page for player {} invalidated during build, not caching", id);
        }

        Ok(page)
    }

    /// Drop the cached page; the next read rebuilds it.
    pub async fn invalidate(&self, id: &PlayerId) -> Result<(), StatsError> {
        debug!("Invalidating page for player {}", id);
        let mut generations = self.generations.lock().await;
        *generations.entry(id.clone()).or_default() += 1;
        self.cache.delete(&CacheKey::PlayerPage(id.clone()).to_string()).await?;
        Ok(())
    }

    async fn generation(&self, id: &PlayerId) -> u64 {
        self.generations.lock().await.get(id).copied().unwrap_or(0)
    }

    async fn build(&self, player: Player) -> Result<PlayerPage, StatsError> {
        let id = player.id.clone();

        let (history, mut restrictions) = tokio::try_join!(
            self.source.find_player_history_games(&id),
            self.source.find_restrictions(&id),
        )?;
        restrictions.sort_by(Restriction::page_order);

        let ratings = if self.hide_ratings {
            None
        } else {
            let mut ratings = self.source.all_ratings(&id).await?;
            ratings.sort_by_key(|r| r.date);
            Some(ratings)
        };

        let games = history
            .into_iter()
            .map(|game| PageGame::for_player(game, &id))
            .collect::<Vec<_>>();

        debug!("Built page for player {} with {} games", id, games.len());

        Ok(PlayerPage {
            player,
            games,
            restrictions,
            restriction_durations: self.restriction_durations.clone(),
            ratings,
        })
    }
}
