//! In-memory data source, optionally backed by JSONL files.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{Collection, DataSource, JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::models::{Game, GameStatus, Player, PlayerId, Rating, Restriction, Stats};

#[derive(Debug, Default)]
struct Collections {
    users: Vec<Player>,
    games: Vec<Game>,
    ratings: Vec<Rating>,
    restrictions: Vec<Restriction>,
}

/// Data source holding every collection in memory.
///
/// When opened from a data directory, stat writes are flushed back to
/// `users.jsonl`; the in-memory copy only changes once that write succeeds.
#[derive(Debug, Default)]
pub struct MemoryDataSource {
    data: RwLock<Collections>,
    backing: Option<StorageConfig>,
}

impl MemoryDataSource {
    /// Empty, unbacked source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load all collections from the data directory.
    pub fn open(config: StorageConfig) -> Result<Self, StorageError> {
        let data = Collections {
            users: JsonlReader::for_collection(&config, Collection::Users).read_all()?,
            games: JsonlReader::for_collection(&config, Collection::Games).read_all()?,
            ratings: JsonlReader::for_collection(&config, Collection::Ratings).read_all()?,
            restrictions: JsonlReader::for_collection(&config, Collection::Restrictions)
                .read_all()?,
        };

        info!(
            "Loaded {} users, {} games, {} ratings, {} restrictions from {:?}",
            data.users.len(),
            data.games.len(),
            data.ratings.len(),
            data.restrictions.len(),
            config.data_dir
        );

        Ok(Self {
            data: RwLock::new(data),
            backing: Some(config),
        })
    }

    /// Insert or replace a player by id. Not persisted on its own.
    pub async fn insert_player(&self, player: Player) {
        let mut data = self.data.write().await;
        match data.users.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => *existing = player,
            None => data.users.push(player),
        }
    }

    /// Insert or replace a game by id. Not persisted on its own.
    pub async fn insert_game(&self, game: Game) {
        let mut data = self.data.write().await;
        match data.games.iter_mut().find(|g| g.id == game.id) {
            Some(existing) => *existing = game,
            None => data.games.push(game),
        }
    }

    pub async fn insert_rating(&self, rating: Rating) {
        self.data.write().await.ratings.push(rating);
    }

    pub async fn insert_restriction(&self, restriction: Restriction) {
        self.data.write().await.restrictions.push(restriction);
    }

    async fn games_where<F>(&self, predicate: F) -> Vec<Game>
    where
        F: Fn(&Game) -> bool,
    {
        let data = self.data.read().await;
        data.games.iter().filter(|g| predicate(g)).cloned().collect()
    }

    async fn count_where<F>(&self, predicate: F) -> u32
    where
        F: Fn(&Game) -> bool,
    {
        let data = self.data.read().await;
        data.games.iter().filter(|g| predicate(g)).count() as u32
    }

    async fn find_user_where<F>(&self, predicate: F) -> Option<Player>
    where
        F: Fn(&Player) -> bool,
    {
        let data = self.data.read().await;
        data.users.iter().find(|p| predicate(p)).cloned()
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn find_user(&self, id: &PlayerId) -> Result<Option<Player>, StorageError> {
        Ok(self.find_user_where(|p| &p.id == id).await)
    }

    async fn find_user_by_alias(&self, alias: &str) -> Result<Option<Player>, StorageError> {
        Ok(self.find_user_where(|p| p.alias == alias).await)
    }

    async fn find_user_by_platform_id(
        &self,
        platform_id: &str,
    ) -> Result<Option<Player>, StorageError> {
        Ok(self.find_user_where(|p| p.platform_id == platform_id).await)
    }

    async fn find_all_users(&self) -> Result<Vec<Player>, StorageError> {
        Ok(self.data.read().await.users.clone())
    }

    async fn save_player_stats(&self, id: &PlayerId, stats: &Stats) -> Result<(), StorageError> {
        let mut data = self.data.write().await;

        let index = data
            .users
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("player {}", id)))?;

        if let Some(config) = &self.backing {
            let mut users = data.users.clone();
            users[index].stats = stats.clone();
            JsonlWriter::for_collection(config, Collection::Users).write_all(&users)?;
            data.users = users;
        } else {
            data.users[index].stats = stats.clone();
        }

        debug!("Saved stats for player {}", id);
        Ok(())
    }

    async fn count_completed_games_as_captain(&self, id: &PlayerId) -> Result<u32, StorageError> {
        Ok(self
            .count_where(|g| g.status == GameStatus::Completed && g.is_captain(id))
            .await)
    }

    async fn count_completed_games_as_roster(&self, id: &PlayerId) -> Result<u32, StorageError> {
        Ok(self
            .count_where(|g| g.status == GameStatus::Completed && g.is_roster_member(id))
            .await)
    }

    async fn find_completed_games_as_captain(
        &self,
        id: &PlayerId,
    ) -> Result<Vec<Game>, StorageError> {
        Ok(self.games_where(|g| g.is_scored() && g.is_captain(id)).await)
    }

    async fn find_completed_games_as_roster(
        &self,
        id: &PlayerId,
    ) -> Result<Vec<Game>, StorageError> {
        Ok(self
            .games_where(|g| g.is_scored() && g.is_roster_member(id))
            .await)
    }

    async fn count_games_as_captain(&self, id: &PlayerId) -> Result<u32, StorageError> {
        Ok(self.count_where(|g| g.is_captain(id)).await)
    }

    async fn count_games_where_picked(&self, id: &PlayerId) -> Result<u32, StorageError> {
        Ok(self.count_where(|g| g.was_picked(id)).await)
    }

    async fn find_games_where_picked(&self, id: &PlayerId) -> Result<Vec<Game>, StorageError> {
        Ok(self.games_where(|g| g.was_picked(id)).await)
    }

    async fn count_games_in_pool_undrafted(&self, id: &PlayerId) -> Result<u32, StorageError> {
        Ok(self
            .count_where(|g| g.in_draft_pool(id) && !g.was_picked(id) && !g.is_captain(id))
            .await)
    }

    async fn count_games_by_role(&self, role: &str, id: &PlayerId) -> Result<u32, StorageError> {
        Ok(self.count_where(|g| g.played_role(role, id)).await)
    }

    async fn count_substituted_in(&self, id: &PlayerId) -> Result<u32, StorageError> {
        Ok(self
            .count_where(|g| g.is_roster_member(id) && !g.was_picked(id) && !g.is_captain(id))
            .await)
    }

    async fn count_substituted_out(&self, id: &PlayerId) -> Result<u32, StorageError> {
        Ok(self.count_where(|g| g.was_replaced(id)).await)
    }

    async fn latest_rating(&self, id: &PlayerId) -> Result<Option<Rating>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .ratings
            .iter()
            .filter(|r| &r.user == id)
            .max_by_key(|r| r.date)
            .cloned())
    }

    async fn all_ratings(&self, id: &PlayerId) -> Result<Vec<Rating>, StorageError> {
        let data = self.data.read().await;
        Ok(data.ratings.iter().filter(|r| &r.user == id).cloned().collect())
    }

    async fn find_player_history_games(&self, id: &PlayerId) -> Result<Vec<Game>, StorageError> {
        let mut games = self
            .games_where(|g| {
                g.status.is_listed_in_history() && (g.is_captain(id) || g.is_roster_member(id))
            })
            .await;
        games.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(games)
    }

    async fn find_restrictions(&self, id: &PlayerId) -> Result<Vec<Restriction>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .restrictions
            .iter()
            .filter(|r| &r.user == id)
            .cloned()
            .collect())
    }
}

/// Wraps a `MemoryDataSource` and stalls `find_restrictions`, so tests can
/// interleave writes with a page build.
#[cfg(test)]
pub struct SlowRestrictions {
    pub inner: std::sync::Arc<MemoryDataSource>,
    pub delay: std::time::Duration,
}

#[cfg(test)]
#[async_trait]
impl DataSource for SlowRestrictions {
    async fn find_user(&self, id: &PlayerId) -> Result<Option<Player>, StorageError> {
        self.inner.find_user(id).await
    }

    async fn find_user_by_alias(&self, alias: &str) -> Result<Option<Player>, StorageError> {
        self.inner.find_user_by_alias(alias).await
    }

    async fn find_user_by_platform_id(
        &self,
        platform_id: &str,
    ) -> Result<Option<Player>, StorageError> {
        self.inner.find_user_by_platform_id(platform_id).await
    }

    async fn find_all_users(&self) -> Result<Vec<Player>, StorageError> {
        self.inner.find_all_users().await
    }

    async fn save_player_stats(&self, id: &PlayerId, stats: &Stats) -> Result<(), StorageError> {
        self.inner.save_player_stats(id, stats).await
    }

    async fn count_completed_games_as_captain(&self, id: &PlayerId) -> Result<u32, StorageError> {
        self.inner.count_completed_games_as_captain(id).await
    }

    async fn count_completed_games_as_roster(&self, id: &PlayerId) -> Result<u32, StorageError> {
        self.inner.count_completed_games_as_roster(id).await
    }

    async fn find_completed_games_as_captain(
        &self,
        id: &PlayerId,
    ) -> Result<Vec<Game>, StorageError> {
        self.inner.find_completed_games_as_captain(id).await
    }

    async fn find_completed_games_as_roster(
        &self,
        id: &PlayerId,
    ) -> Result<Vec<Game>, StorageError> {
        self.inner.find_completed_games_as_roster(id).await
    }

    async fn count_games_as_captain(&self, id: &PlayerId) -> Result<u32, StorageError> {
        self.inner.count_games_as_captain(id).await
    }

    async fn count_games_where_picked(&self, id: &PlayerId) -> Result<u32, StorageError> {
        self.inner.count_games_where_picked(id).await
    }

    async fn find_games_where_picked(&self, id: &PlayerId) -> Result<Vec<Game>, StorageError> {
        self.inner.find_games_where_picked(id).await
    }

    async fn count_games_in_pool_undrafted(&self, id: &PlayerId) -> Result<u32, StorageError> {
        self.inner.count_games_in_pool_undrafted(id).await
    }

    async fn count_games_by_role(&self, role: &str, id: &PlayerId) -> Result<u32, StorageError> {
        self.inner.count_games_by_role(role, id).await
    }

    async fn count_substituted_in(&self, id: &PlayerId) -> Result<u32, StorageError> {
        self.inner.count_substituted_in(id).await
    }

    async fn count_substituted_out(&self, id: &PlayerId) -> Result<u32, StorageError> {
        self.inner.count_substituted_out(id).await
    }

    async fn latest_rating(&self, id: &PlayerId) -> Result<Option<Rating>, StorageError> {
        self.inner.latest_rating(id).await
    }

    async fn all_ratings(&self, id: &PlayerId) -> Result<Vec<Rating>, StorageError> {
        self.inner.all_ratings(id).await
    }

    async fn find_player_history_games(&self, id: &PlayerId) -> Result<Vec<Game>, StorageError> {
        self.inner.find_player_history_games(id).await
    }

    async fn find_restrictions(&self, id: &PlayerId) -> Result<Vec<Restriction>, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_restrictions(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Draft, DraftChoice, RatingAfter, RoleSlot, SlotPlayer, Team};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn game(
        id: &str,
        day: u32,
        status: GameStatus,
        captains: (&str, &str),
        rosters: (&[&str], &[&str]),
    ) -> Game {
        let team = |captain: &str, roster: &[&str]| {
            Team::new(
                captain,
                vec![RoleSlot::new(
                    "scout",
                    roster.iter().map(|p| SlotPlayer::new(*p)).collect(),
                )],
            )
        };
        Game::new(
            id,
            Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            status,
            [team(captains.0, rosters.0), team(captains.1, rosters.1)],
        )
    }

    async fn seeded() -> MemoryDataSource {
        let source = MemoryDataSource::new();
        source.insert_player(Player::new("p1", "alpha", "1")).await;
        source.insert_player(Player::new("cap", "captain", "2")).await;

        source
            .insert_game(
                game("g1", 1, GameStatus::Completed, ("cap", "x"), (&["p1"], &["y"]))
                    .with_score(3, 1)
                    .with_draft(Draft {
                        choices: vec![DraftChoice::pick("y"), DraftChoice::pick("p1")],
                        pool: vec!["p1".into(), "y".into(), "z".into()],
                    }),
            )
            .await;
        // Completed but never scored
        source
            .insert_game(game("g2", 2, GameStatus::Completed, ("cap", "x"), (&["z"], &["p1"])))
            .await;
        source
            .insert_game(game("g3", 3, GameStatus::Live, ("x", "cap"), (&["p1"], &["y"])))
            .await;
        source
            .insert_game(game("g4", 4, GameStatus::Forming, ("x", "y"), (&["p1"], &["cap"])))
            .await;
        source
    }

    #[tokio::test]
    async fn test_completed_queries() {
        let source = seeded().await;
        let cap = PlayerId::from("cap");
        let p1 = PlayerId::from("p1");

        assert_eq!(source.count_completed_games_as_captain(&cap).await.unwrap(), 2);
        assert_eq!(source.find_completed_games_as_captain(&cap).await.unwrap().len(), 1);
        assert_eq!(source.count_completed_games_as_roster(&p1).await.unwrap(), 2);
        assert_eq!(source.find_completed_games_as_roster(&p1).await.unwrap().len(), 1);
        assert_eq!(source.count_games_as_captain(&cap).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_draft_queries() {
        let source = seeded().await;
        let p1 = PlayerId::from("p1");

        assert_eq!(source.count_games_where_picked(&p1).await.unwrap(), 1);
        assert_eq!(source.find_games_where_picked(&p1).await.unwrap()[0].id.as_str(), "g1");
        assert_eq!(source.count_games_in_pool_undrafted(&p1).await.unwrap(), 0);
        assert_eq!(source.count_games_in_pool_undrafted(&"z".into()).await.unwrap(), 1);

        // g2, g3 and g4 list p1 without a pick
        assert_eq!(source.count_substituted_in(&p1).await.unwrap(), 3);
        assert_eq!(source.count_games_by_role("scout", &p1).await.unwrap(), 4);
        assert_eq!(source.count_games_by_role("medic", &p1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_history_excludes_forming_and_sorts_newest_first() {
        let source = seeded().await;
        let games = source.find_player_history_games(&"p1".into()).await.unwrap();

        let ids: Vec<&str> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g3", "g2", "g1"]);
    }

    #[tokio::test]
    async fn test_latest_rating() {
        let source = MemoryDataSource::new();
        let after = |mean| RatingAfter {
            mean,
            deviation: 50.0,
            low: mean - 50.0,
            high: mean + 50.0,
        };
        for (day, mean) in [(3, 1530.0), (9, 1560.0), (5, 1545.0)] {
            source
                .insert_rating(Rating::new(
                    "p1",
                    Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap(),
                    mean - 15.0,
                    52.0,
                    after(mean),
                ))
                .await;
        }

        let latest = source.latest_rating(&"p1".into()).await.unwrap().unwrap();
        assert_eq!(latest.after.mean, 1560.0);
        assert_eq!(source.all_ratings(&"p1".into()).await.unwrap().len(), 3);
        assert!(source.latest_rating(&"p2".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_lookups() {
        let source = seeded().await;

        assert!(source.find_user(&"p1".into()).await.unwrap().is_some());
        assert!(source.find_user(&"nobody".into()).await.unwrap().is_none());
        assert_eq!(
            source.find_user_by_alias("captain").await.unwrap().unwrap().id.as_str(),
            "cap"
        );
        assert_eq!(
            source.find_user_by_platform_id("1").await.unwrap().unwrap().id.as_str(),
            "p1"
        );
        assert_eq!(source.find_all_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_player_stats_unknown_player() {
        let source = MemoryDataSource::new();
        let result = source.save_player_stats(&"ghost".into(), &Stats::default()).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_open_and_persist_stats() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        JsonlWriter::for_collection(&config, Collection::Users)
            .write_all(&[Player::new("p1", "alpha", "1")])
            .unwrap();

        let source = MemoryDataSource::open(config.clone()).unwrap();
        let mut stats = Stats::default();
        stats.total.player = 7;
        source.save_player_stats(&"p1".into(), &stats).await.unwrap();

        let reopened = MemoryDataSource::open(config).unwrap();
        let player = reopened.find_user(&"p1".into()).await.unwrap().unwrap();
        assert_eq!(player.stats.total.player, 7);
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_memory_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        JsonlWriter::for_collection(&config, Collection::Users)
            .write_all(&[Player::new("p1", "alpha", "1")])
            .unwrap();
        let source = MemoryDataSource::open(config.clone()).unwrap();

        // A directory squatting on the temp path makes the rewrite fail.
        let tmp_path = config.path_for(Collection::Users).with_extension("jsonl.tmp");
        std::fs::create_dir(tmp_path).unwrap();

        let mut stats = Stats::default();
        stats.total.captain = 3;
        assert!(source.save_player_stats(&"p1".into(), &stats).await.is_err());

        let player = source.find_user(&"p1".into()).await.unwrap().unwrap();
        assert_eq!(player.stats, Stats::default());
    }
}
