//! Game (match) records as read from the game log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GameId, PlayerId};

/// Lifecycle status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Forming,
    Launching,
    Live,
    Completed,
    Aborted,
}

impl GameStatus {
    /// Statuses shown in a player's game history.
    pub fn is_listed_in_history(&self) -> bool {
        matches!(
            self,
            GameStatus::Launching | GameStatus::Live | GameStatus::Completed
        )
    }
}

/// One of the two sides of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Side::First),
            1 => Some(Side::Second),
            _ => None,
        }
    }
}

/// A player occupying a role slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPlayer {
    pub user: PlayerId,

    /// Set when this player was substituted out of the slot
    #[serde(default)]
    pub replaced: bool,
}

impl SlotPlayer {
    pub fn new(user: impl Into<PlayerId>) -> Self {
        Self {
            user: user.into(),
            replaced: false,
        }
    }

    pub fn replaced(user: impl Into<PlayerId>) -> Self {
        Self {
            user: user.into(),
            replaced: true,
        }
    }
}

/// A role in a team composition and everyone who filled it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSlot {
    pub role: String,
    #[serde(default)]
    pub players: Vec<SlotPlayer>,
}

impl RoleSlot {
    pub fn new(role: impl Into<String>, players: Vec<SlotPlayer>) -> Self {
        Self {
            role: role.into(),
            players,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Team {
    pub captain: Option<PlayerId>,
    #[serde(default)]
    pub composition: Vec<RoleSlot>,
}

impl Team {
    pub fn new(captain: impl Into<PlayerId>, composition: Vec<RoleSlot>) -> Self {
        Self {
            captain: Some(captain.into()),
            composition,
        }
    }

    pub fn is_captained_by(&self, player: &PlayerId) -> bool {
        self.captain.as_ref() == Some(player)
    }

    pub fn has_member(&self, player: &PlayerId) -> bool {
        self.composition
            .iter()
            .flat_map(|slot| slot.players.iter())
            .any(|p| &p.user == player)
    }
}

/// Kind of a draft step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftChoiceKind {
    PlayerPick,
    CaptainRole,
    FactionSelect,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftChoice {
    #[serde(rename = "type")]
    pub kind: DraftChoiceKind,
    #[serde(default)]
    pub player: Option<PlayerId>,
}

impl DraftChoice {
    pub fn pick(player: impl Into<PlayerId>) -> Self {
        Self {
            kind: DraftChoiceKind::PlayerPick,
            player: Some(player.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Draft {
    /// Ordered log of draft steps
    #[serde(default)]
    pub choices: Vec<DraftChoice>,

    /// Players available for picking
    #[serde(default)]
    pub pool: Vec<PlayerId>,
}

/// Link from one game to another (e.g. a rematch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLink {
    pub game: GameId,
    pub kind: String,
}

/// A game as recorded in the game log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub date: DateTime<Utc>,
    pub status: GameStatus,
    pub teams: [Team; 2],

    /// Final score per team, present once completed
    #[serde(default)]
    pub score: Option<[u32; 2]>,

    /// Match length in seconds
    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub draft: Draft,

    /// Game server assignment
    #[serde(default)]
    pub server: Option<String>,

    #[serde(default)]
    pub links: Vec<GameLink>,
}

impl Game {
    pub fn new(
        id: impl Into<GameId>,
        date: DateTime<Utc>,
        status: GameStatus,
        teams: [Team; 2],
    ) -> Self {
        Self {
            id: id.into(),
            date,
            status,
            teams,
            score: None,
            duration: None,
            draft: Draft::default(),
            server: None,
            links: Vec::new(),
        }
    }

    /// Builder method to set the final score.
    pub fn with_score(mut self, first: u32, second: u32) -> Self {
        self.score = Some([first, second]);
        self
    }

    /// Builder method to set the duration in seconds.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Builder method to set the draft log.
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = draft;
        self
    }

    /// Completed with a recorded score; the only games that count toward
    /// records and score differentials.
    pub fn is_scored(&self) -> bool {
        self.status == GameStatus::Completed && self.score.is_some()
    }

    /// Side the player captained, if any.
    pub fn captain_side(&self, player: &PlayerId) -> Option<Side> {
        self.teams
            .iter()
            .position(|team| team.is_captained_by(player))
            .and_then(Side::from_index)
    }

    /// Side whose composition lists the player, if any.
    pub fn roster_side(&self, player: &PlayerId) -> Option<Side> {
        self.teams
            .iter()
            .position(|team| team.has_member(player))
            .and_then(Side::from_index)
    }

    pub fn is_captain(&self, player: &PlayerId) -> bool {
        self.captain_side(player).is_some()
    }

    pub fn is_roster_member(&self, player: &PlayerId) -> bool {
        self.roster_side(player).is_some()
    }

    /// 1-based position among `playerPick` choices at which the player was
    /// picked.
    pub fn pick_position(&self, player: &PlayerId) -> Option<u32> {
        let mut position = 0;
        for choice in &self.draft.choices {
            if choice.kind == DraftChoiceKind::PlayerPick {
                position += 1;
                if choice.player.as_ref() == Some(player) {
                    return Some(position);
                }
            }
        }
        None
    }

    pub fn was_picked(&self, player: &PlayerId) -> bool {
        self.pick_position(player).is_some()
    }

    pub fn in_draft_pool(&self, player: &PlayerId) -> bool {
        self.draft.pool.contains(player)
    }

    /// Played a slot of the given role.
    pub fn played_role(&self, role: &str, player: &PlayerId) -> bool {
        self.teams
            .iter()
            .flat_map(|team| team.composition.iter())
            .filter(|slot| slot.role == role)
            .any(|slot| slot.players.iter().any(|p| &p.user == player))
    }

    /// Substituted out of some slot.
    pub fn was_replaced(&self, player: &PlayerId) -> bool {
        self.teams
            .iter()
            .flat_map(|team| team.composition.iter())
            .flat_map(|slot| slot.players.iter())
            .any(|p| &p.user == player && p.replaced)
    }

    /// Whether the player's team is the second one, so a display oriented on
    /// the player must swap sides. Captaincy wins over roster membership.
    pub fn reverse_teams_for(&self, player: &PlayerId) -> bool {
        match self.captain_side(player) {
            Some(side) => side == Side::Second,
            None => self
                .roster_side(player)
                .map(|side| side != Side::First)
                .unwrap_or(true),
        }
    }
}
