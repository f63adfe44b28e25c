//! Player record and its derived statistics.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// Win/loss/tie record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Record {
    pub win: u32,
    pub loss: u32,
    pub tie: u32,
}

impl Record {
    /// Create a new record.
    pub fn new(win: u32, loss: u32, tie: u32) -> Self {
        Self { win, loss, tie }
    }

    /// Total games counted.
    pub fn total_games(&self) -> u32 {
        self.win + self.loss + self.tie
    }
}

/// Prediction interval over per-game differentials.
///
/// `low`/`high` are only defined for two or more samples, `center` for one or
/// more.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreInterval {
    pub low: Option<f64>,
    pub center: Option<f64>,
    pub high: Option<f64>,
}

impl ScoreInterval {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn point(center: f64) -> Self {
        Self {
            low: None,
            center: Some(center),
            high: None,
        }
    }
}

/// Current rating, copied from the newest rating snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RatingStats {
    pub mean: Option<f64>,
    pub deviation: Option<f64>,
    pub low: Option<f64>,
    pub high: Option<f64>,
}

/// One bucket of the draft outcome histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DraftStat {
    Captain { count: u32 },
    Picked { position: u32, count: u32 },
    Undrafted { count: u32 },
}

impl DraftStat {
    pub fn count(&self) -> u32 {
        match *self {
            DraftStat::Captain { count }
            | DraftStat::Picked { count, .. }
            | DraftStat::Undrafted { count } => count,
        }
    }
}

/// Games played in one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleStat {
    pub role: String,
    pub count: u32,
}

/// Lifetime participation counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Totals {
    pub captain: u32,
    pub player: u32,
}

/// Substitution counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Replaced {
    pub into: u32,
    pub out: u32,
}

/// Derived statistics embedded in a player record.
///
/// This is a cache of a pure function over the player's game and rating
/// history: every recomputation replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Stats {
    #[serde(default)]
    pub rating: RatingStats,
    #[serde(default)]
    pub captain_record: Record,
    #[serde(default)]
    pub player_record: Record,
    #[serde(default)]
    pub captain_score: ScoreInterval,
    #[serde(default)]
    pub player_score: ScoreInterval,
    #[serde(default)]
    pub draft: Vec<DraftStat>,
    #[serde(default)]
    pub roles: Vec<RoleStat>,
    #[serde(default)]
    pub total: Totals,
    #[serde(default)]
    pub replaced: Replaced,
}

/// A registered player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    /// Display alias
    pub alias: String,

    /// External platform account ID
    pub platform_id: String,

    /// Whether the player may take part in games
    #[serde(default)]
    pub authorized: bool,

    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub stats: Stats,
}

impl Player {
    pub fn new(
        id: impl Into<PlayerId>,
        alias: impl Into<String>,
        platform_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            alias: alias.into(),
            platform_id: platform_id.into(),
            authorized: false,
            groups: Vec::new(),
            stats: Stats::default(),
        }
    }

    /// Builder method to set the authorization flag.
    pub fn with_authorized(mut self, authorized: bool) -> Self {
        self.authorized = authorized;
        self
    }

    /// Builder method to set group memberships.
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Builder method to set stats.
    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.stats = stats;
        self
    }

    /// Authorized and has at least one captain or roster appearance.
    pub fn is_active(&self) -> bool {
        self.authorized && (self.stats.total.captain > 0 || self.stats.total.player > 0)
    }
}
