//! Rating snapshots produced by the external rating process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GameId, PlayerId};

/// Rating after a game, with its one-deviation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAfter {
    pub mean: f64,
    pub deviation: f64,
    pub low: f64,
    pub high: f64,
}

/// Per-player, per-date rating snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user: PlayerId,
    pub date: DateTime<Utc>,

    /// Game that produced this snapshot
    #[serde(default)]
    pub game: Option<GameId>,

    /// Rating before the game
    pub mean: f64,
    pub deviation: f64,

    pub after: RatingAfter,
}

impl Rating {
    pub fn new(
        user: impl Into<PlayerId>,
        date: DateTime<Utc>,
        mean: f64,
        deviation: f64,
        after: RatingAfter,
    ) -> Self {
        Self {
            user: user.into(),
            date,
            game: None,
            mean,
            deviation,
            after,
        }
    }
}
