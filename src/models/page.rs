//! Composite per-player page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Game, GameId, GameStatus, Player, PlayerId, Rating, Restriction, Team};

/// A history game as shown on a player page, without draft detail, server
/// assignment or inter-game links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageGame {
    pub id: GameId,
    pub date: DateTime<Utc>,
    pub status: GameStatus,
    pub teams: [Team; 2],
    pub score: Option<[u32; 2]>,
    pub duration: Option<f64>,

    /// True when the viewed player's team is the second team
    pub reverse_teams: bool,
}

impl PageGame {
    pub fn for_player(game: Game, player: &PlayerId) -> Self {
        let reverse_teams = game.reverse_teams_for(player);
        Self {
            id: game.id,
            date: game.date,
            status: game.status,
            teams: game.teams,
            score: game.score,
            duration: game.duration,
            reverse_teams,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPage {
    pub player: Player,
    pub games: Vec<PageGame>,
    pub restrictions: Vec<Restriction>,
    pub restriction_durations: Vec<String>,

    /// Full rating history, oldest first; absent when ratings are hidden
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<Rating>>,
}
