//! Recompute a player's derived statistics from their history.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::StatsError;
use crate::calculate::{differential, outcome, prediction_interval, tally};
use crate::models::{
    DraftStat, Game, Player, PlayerId, RatingStats, Record, Replaced, RoleStat, ScoreInterval, Side,
    Stats, Totals,
};
use crate::storage::{DataSource, StorageError};

/// Builds `Stats` from independent data source reads.
///
/// The reads are not a snapshot: a game recorded mid-run may show up in some
/// figures and not others until the next recompute.
pub struct StatsAggregator {
    source: Arc<dyn DataSource>,
    roles: Vec<String>,
    draft_picks: u32,
}

impl StatsAggregator {
    pub fn new(source: Arc<dyn DataSource>, roles: Vec<String>, draft_picks: u32) -> Self {
        Self {
            source,
            roles,
            draft_picks,
        }
    }

    /// Compute fresh stats without storing them.
    pub async fn compute(&self, id: &PlayerId) -> Result<Stats, StatsError> {
        let player = self
            .source
            .find_user(id)
            .await?
            .ok_or_else(|| StatsError::NotFound(format!("player {}", id)))?;

        debug!("Aggregating stats for player {}", id);

        let (captain_games, roster_games, captain_total, roster_total) = tokio::try_join!(
            self.source.find_completed_games_as_captain(id),
            self.source.find_completed_games_as_roster(id),
            self.source.count_completed_games_as_captain(id),
            self.source.count_completed_games_as_roster(id),
        )?;

        let (draft, roles, replaced, rating) = tokio::try_join!(
            self.draft_stats(id),
            self.role_stats(id),
            self.replaced_stats(id),
            self.rating_stats(&player),
        )?;

        let (captain_record, captain_score) = side_results(&captain_games, id, Game::captain_side);
        let (player_record, player_score) = side_results(&roster_games, id, Game::roster_side);

        Ok(Stats {
            rating,
            captain_record,
            player_record,
            captain_score,
            player_score,
            draft,
            roles,
            total: Totals {
                captain: captain_total,
                player: roster_total,
            },
            replaced,
        })
    }

    /// Compute and persist. Nothing is written unless every figure was
    /// computed.
    pub async fn update(&self, id: &PlayerId) -> Result<Stats, StatsError> {
        let stats = self.compute(id).await?;
        self.source.save_player_stats(id, &stats).await?;

        info!(
            "Updated stats for player {}: {} captain / {} roster games",
            id, stats.total.captain, stats.total.player
        );
        Ok(stats)
    }

    /// Captain entry, one entry per pick position, then undrafted.
    async fn draft_stats(&self, id: &PlayerId) -> Result<Vec<DraftStat>, StorageError> {
        let (captain, picked_games, undrafted) = tokio::try_join!(
            self.source.count_games_as_captain(id),
            self.source.find_games_where_picked(id),
            self.source.count_games_in_pool_undrafted(id),
        )?;

        let mut positions: BTreeMap<u32, u32> = (1..=self.draft_picks).map(|p| (p, 0)).collect();
        for game in &picked_games {
            if let Some(position) = game.pick_position(id) {
                *positions.entry(position).or_insert(0) += 1;
            }
        }

        let mut draft = Vec::with_capacity(positions.len() + 2);
        draft.push(DraftStat::Captain { count: captain });
        draft.extend(
            positions
                .into_iter()
                .map(|(position, count)| DraftStat::Picked { position, count }),
        );
        draft.push(DraftStat::Undrafted { count: undrafted });

        Ok(draft)
    }

    async fn role_stats(&self, id: &PlayerId) -> Result<Vec<RoleStat>, StorageError> {
        let mut roles = Vec::with_capacity(self.roles.len());
        for role in &self.roles {
            let count = self.source.count_games_by_role(role, id).await?;
            roles.push(RoleStat {
                role: role.clone(),
                count,
            });
        }
        Ok(roles)
    }

    async fn replaced_stats(&self, id: &PlayerId) -> Result<Replaced, StorageError> {
        let (into, out) = tokio::try_join!(
            self.source.count_substituted_in(id),
            self.source.count_substituted_out(id),
        )?;
        Ok(Replaced { into, out })
    }

    /// Mean and deviation follow the newest rating snapshot; the bounds are
    /// maintained by the rating process and carried over.
    async fn rating_stats(&self, player: &Player) -> Result<RatingStats, StorageError> {
        let current = player.stats.rating;
        let latest = self.source.latest_rating(&player.id).await?;

        Ok(match latest {
            Some(rating) => RatingStats {
                mean: Some(rating.after.mean),
                deviation: Some(rating.after.deviation),
                ..current
            },
            None => current,
        })
    }
}

/// Record and score interval over the games, from the side `side_of` finds
/// for the player.
fn side_results<F>(games: &[Game], id: &PlayerId, side_of: F) -> (Record, ScoreInterval)
where
    F: Fn(&Game, &PlayerId) -> Option<Side>,
{
    let mut outcomes = Vec::with_capacity(games.len());
    let mut differentials = Vec::with_capacity(games.len());

    for game in games {
        let (Some(side), Some(score)) = (side_of(game, id), game.score) else {
            debug!("Skipping game {} for player {}: no side or score", game.id, id);
            continue;
        };
        outcomes.push(outcome(score, side));
        differentials.push(differential(score, side, game.duration));
    }

    (tally(outcomes), prediction_interval(&differentials))
}
