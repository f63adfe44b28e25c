//! Entry points for keeping derived player data current.

use std::sync::Arc;

use tracing::{info, warn};

use super::{PlayerLocks, StatsAggregator, StatsError, StatsSettings};
use crate::cache::{CacheStore, PlayerListProjector, PlayerLists, PlayerPageCache};
use crate::models::{PlayerId, PlayerListing, PlayerPage, Stats};
use crate::storage::DataSource;

/// Sequences stat recomputes with cache maintenance.
///
/// All shared handles are passed in; nothing here is global.
pub struct StatsUpdateCoordinator {
    source: Arc<dyn DataSource>,
    aggregator: StatsAggregator,
    lists: PlayerListProjector,
    pages: PlayerPageCache,
    locks: PlayerLocks,
}

impl StatsUpdateCoordinator {
    /// Must be called inside a tokio runtime.
    pub fn new(
        source: Arc<dyn DataSource>,
        cache: Arc<dyn CacheStore>,
        settings: StatsSettings,
    ) -> Self {
        let aggregator =
            StatsAggregator::new(source.clone(), settings.roles, settings.draft_picks);
        let lists = PlayerListProjector::new(
            source.clone(),
            cache.clone(),
            settings.hide_ratings,
            settings.list_debounce,
        );
        let pages = PlayerPageCache::new(
            source.clone(),
            cache,
            settings.hide_ratings,
            settings.restriction_durations,
        );

        Self {
            source,
            aggregator,
            lists,
            pages,
            locks: PlayerLocks::new(),
        }
    }

    /// Recompute and persist a player's stats after their game history
    /// changed.
    ///
    /// The page is invalidated before the recompute and again after the
    /// write. A page build that overlaps the write sees its generation
    /// change and is not cached. List projections are refreshed on the
    /// debounce schedule.
    pub async fn update_player_stats(&self, id: &PlayerId) -> Result<Stats, StatsError> {
        let _guard = self.locks.acquire(id).await;

        self.pages.invalidate(id).await?;
        let stats = self.aggregator.update(id).await?;
        self.pages.invalidate(id).await?;

        self.lists.schedule();
        Ok(stats)
    }

    /// Profile data changed without new games: refresh projections only.
    pub async fn player_updated(&self, id: &PlayerId) -> Result<(), StatsError> {
        self.pages.invalidate(id).await?;
        self.lists.schedule();
        Ok(())
    }

    /// Recompute every player. Failures are logged and counted; returns the
    /// number of players updated.
    pub async fn update_all_player_stats(&self) -> Result<usize, StatsError> {
        let players = self.source.find_all_users().await?;
        let total = players.len();
        let mut updated = 0;

        for player in players {
            match self.update_player_stats(&player.id).await {
                Ok(_) => updated += 1,
                Err(e) => warn!("Failed to update stats for player {}: {}", player.id, e),
            }
        }

        info!("Updated stats for {}/{} players", updated, total);
        Ok(updated)
    }

    pub async fn get_player_list(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<PlayerListing>, StatsError> {
        self.lists.get_player_list(include_inactive).await
    }

    /// Page by player id, alias or platform id.
    pub async fn get_player_page(&self, handle: &str) -> Result<PlayerPage, StatsError> {
        self.pages.get_page(handle).await
    }

    pub async fn invalidate_player_page(&self, id: &PlayerId) -> Result<(), StatsError> {
        self.pages.invalidate(id).await
    }

    /// Rebuild both lists immediately.
    pub async fn refresh_player_lists(&self) -> Result<PlayerLists, StatsError> {
        self.lists.recompute_now().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, MemoryCache};
    use crate::models::{Game, GameStatus, Player, RoleSlot, SlotPlayer, Team};
    use crate::storage::{
        Collection, JsonlWriter, MemoryDataSource, SlowRestrictions, StorageConfig,
    };
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use tempfile::TempDir;

    fn won_game(id: &str, day: u32, captain: &str, member: &str) -> Game {
        Game::new(
            id,
            Utc.with_ymd_and_hms(2024, 7, day, 18, 0, 0).unwrap(),
            GameStatus::Completed,
            [
                Team::new(captain, vec![RoleSlot::new("player", vec![SlotPlayer::new(member)])]),
                Team::new("opp", vec![RoleSlot::new("player", vec![SlotPlayer::new("other")])]),
            ],
        )
        .with_score(5, 0)
    }

    async fn seeded_source() -> Arc<MemoryDataSource> {
        let source = Arc::new(MemoryDataSource::new());
        source
            .insert_player(Player::new("cap", "captain", "1").with_authorized(true))
            .await;
        source
            .insert_player(Player::new("p1", "alpha", "2").with_authorized(true))
            .await;
        source.insert_game(won_game("g1", 1, "cap", "p1")).await;
        source
    }

    fn coordinator(
        source: Arc<MemoryDataSource>,
        cache: Arc<MemoryCache>,
    ) -> StatsUpdateCoordinator {
        StatsUpdateCoordinator::new(source, cache, StatsSettings::default())
    }

    #[tokio::test]
    async fn test_update_refreshes_page() {
        let source = seeded_source().await;
        let coordinator = coordinator(source.clone(), Arc::new(MemoryCache::new()));

        let stale = coordinator.get_player_page("p1").await.unwrap();
        assert_eq!(stale.player.stats.total.player, 0);

        let stats = coordinator.update_player_stats(&"p1".into()).await.unwrap();
        assert_eq!(stats.total.player, 1);

        let page = coordinator.get_player_page("alpha").await.unwrap();
        assert_eq!(page.player.stats, stats);
        assert_eq!(page.games.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_read_overlapping_update_is_not_cached() {
        let source = Arc::new(SlowRestrictions {
            inner: seeded_source().await,
            delay: Duration::from_millis(100),
        });
        let coordinator = Arc::new(StatsUpdateCoordinator::new(
            source,
            Arc::new(MemoryCache::new()),
            StatsSettings::default(),
        ));

        let reader = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.get_player_page("p1").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let stats = coordinator.update_player_stats(&"p1".into()).await.unwrap();
        assert_eq!(stats.total.player, 1);

        // The overlapping reader saw the old stats
        let overlapped = reader.await.unwrap().unwrap();
        assert_eq!(overlapped.player.stats.total.player, 0);

        let page = coordinator.get_player_page("p1").await.unwrap();
        assert_eq!(page.player.stats.total.player, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_schedules_list_refresh() {
        let source = seeded_source().await;
        let cache = Arc::new(MemoryCache::new());
        let coordinator = coordinator(source, cache.clone());

        let before = coordinator.get_player_list(false).await.unwrap();
        assert!(before.is_empty());

        coordinator.update_player_stats(&"cap".into()).await.unwrap();
        coordinator.update_player_stats(&"p1".into()).await.unwrap();

        // Lists stay as they were until the quiet period passes
        assert!(coordinator.get_player_list(false).await.unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(6)).await;
        let active = coordinator.get_player_list(false).await.unwrap();
        let ids: Vec<&str> = active.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"cap") && ids.contains(&"p1"));
    }

    #[tokio::test]
    async fn test_update_unknown_player() {
        let source = seeded_source().await;
        let coordinator = coordinator(source, Arc::new(MemoryCache::new()));

        let result = coordinator.update_player_stats(&"ghost".into()).await;
        assert!(matches!(result, Err(StatsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_stats() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        JsonlWriter::for_collection(&config, Collection::Users)
            .write_all(&[Player::new("cap", "captain", "1").with_authorized(true)])
            .unwrap();
        JsonlWriter::for_collection(&config, Collection::Games)
            .write_all(&[won_game("g1", 1, "cap", "p1")])
            .unwrap();
        let source = Arc::new(MemoryDataSource::open(config.clone()).unwrap());
        let cache = Arc::new(MemoryCache::new());
        let coordinator = coordinator(source.clone(), cache.clone());

        coordinator.get_player_page("cap").await.unwrap();
        let tmp_path = config.path_for(Collection::Users).with_extension("jsonl.tmp");
        std::fs::create_dir(tmp_path).unwrap();

        let result = coordinator.update_player_stats(&"cap".into()).await;
        assert!(matches!(result, Err(StatsError::DataSourceUnavailable(_))));

        let player = source.find_user(&"cap".into()).await.unwrap().unwrap();
        assert_eq!(player.stats, Stats::default());
        // The page was still dropped before the recompute started
        assert!(cache
            .get(&CacheKey::PlayerPage("cap".into()).to_string())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_concurrent_updates_converge() {
        let source = seeded_source().await;
        let coordinator = coordinator(source.clone(), Arc::new(MemoryCache::new()));
        let id = PlayerId::from("cap");

        let (a, b) = tokio::join!(
            coordinator.update_player_stats(&id),
            coordinator.update_player_stats(&id)
        );
        assert_eq!(a.unwrap(), b.unwrap());

        let stored = source.find_user(&id).await.unwrap().unwrap();
        assert_eq!(stored.stats.captain_record.win, 1);
    }

    #[tokio::test]
    async fn test_update_all_and_player_updated() {
        let source = seeded_source().await;
        let cache = Arc::new(MemoryCache::new());
        let coordinator = coordinator(source.clone(), cache.clone());

        assert_eq!(coordinator.update_all_player_stats().await.unwrap(), 2);
        let lists = coordinator.refresh_player_lists().await.unwrap();
        assert_eq!(lists.active.len(), 2);

        coordinator.get_player_page("p1").await.unwrap();
        coordinator.player_updated(&"p1".into()).await.unwrap();
        assert!(cache
            .get(&CacheKey::PlayerPage("p1".into()).to_string())
            .await
            .unwrap()
            .is_none());
    }
}
