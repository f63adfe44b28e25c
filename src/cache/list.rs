//! Cached "all players" and "active players" listings.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{read_json, CacheError, CacheKey, CacheStore, DebounceTiming, DebouncedJob, Debouncer};
use crate::models::{Player, PlayerListing};
use crate::stats::StatsError;
use crate::storage::DataSource;

/// Both list projections from one recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerLists {
    pub all: Vec<PlayerListing>,
    pub active: Vec<PlayerListing>,
}

/// Descending order with missing values last.
fn desc_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// List order: rating mean, then player score, then captain score.
pub fn list_order(a: &Player, b: &Player) -> Ordering {
    desc_nulls_last(a.stats.rating.mean, b.stats.rating.mean)
        .then_with(|| desc_nulls_last(a.stats.player_score.center, b.stats.player_score.center))
        .then_with(|| desc_nulls_last(a.stats.captain_score.center, b.stats.captain_score.center))
}

struct ListRecompute {
    source: Arc<dyn DataSource>,
    cache: Arc<dyn CacheStore>,
    hide_ratings: bool,
}

impl ListRecompute {
    async fn execute(&self) -> Result<PlayerLists, StatsError> {
        let mut players = self.source.find_all_users().await?;
        players.sort_by(list_order);

        let include_ratings = !self.hide_ratings;
        let mut all = Vec::with_capacity(players.len());
        let mut active = Vec::new();
        for player in &players {
            let listing = PlayerListing::from_player(player, include_ratings);
            if player.is_active() {
                active.push(listing.clone());
            }
            all.push(listing);
        }

        let all_json = serde_json::to_string(&all).map_err(CacheError::from)?;
        let active_json = serde_json::to_string(&active).map_err(CacheError::from)?;
        self.cache
            .set_many(vec![
                (CacheKey::AllPlayerList.to_string(), all_json),
                (CacheKey::ActivePlayerList.to_string(), active_json),
            ])
            .await?;

        info!(
            "Recomputed player lists: {} players, {} active",
            all.len(),
            active.len()
        );
        Ok(PlayerLists { all, active })
    }
}

#[async_trait]
impl DebouncedJob for ListRecompute {
    fn name(&self) -> &'static str {
        "player-lists"
    }

    async fn run(&self) {
        if let Err(e) = self.execute().await {
            warn!("Scheduled player list recompute failed: {}", e);
        }
    }
}

/// Keeps the two list cache entries in step with the player collection.
///
/// Changes go through `schedule`, which is debounced. Reads that miss force
/// an immediate recompute instead of waiting.
pub struct PlayerListProjector {
    recompute: Arc<ListRecompute>,
    debouncer: Debouncer,
}

impl PlayerListProjector {
    /// Must be called inside a tokio runtime.
    pub fn new(
        source: Arc<dyn DataSource>,
        cache: Arc<dyn CacheStore>,
        hide_ratings: bool,
        timing: DebounceTiming,
    ) -> Self {
        let recompute = Arc::new(ListRecompute {
            source,
            cache,
            hide_ratings,
        });
        let debouncer = Debouncer::spawn(recompute.clone(), timing);

        Self {
            recompute,
            debouncer,
        }
    }

    /// Request a debounced recompute.
    pub fn schedule(&self) {
        debug!("Player list recompute scheduled");
        self.debouncer.trigger();
    }

    /// Recompute and store both lists now, bypassing the debounce.
    pub async fn recompute_now(&self) -> Result<PlayerLists, StatsError> {
        self.recompute.execute().await
    }

    /// Cached list, recomputed on a miss or an unreadable entry.
    pub async fn get_player_list(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<PlayerListing>, StatsError> {
        let key = if include_inactive {
            CacheKey::AllPlayerList
        } else {
            CacheKey::ActivePlayerList
        };

        if let Some(list) = read_json(self.recompute.cache.as_ref(), &key).await? {
            return Ok(list);
        }

        let lists = self.recompute_now().await?;
        Ok(if include_inactive { lists.all } else { lists.active })
    }
}
