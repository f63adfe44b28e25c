//! Public player list entries.

use serde::{Deserialize, Serialize};

use super::{Player, PlayerId};
use crate::calculate::round_to;

/// Rating and score figures shown when ratings are public.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListingRatings {
    pub rating_mean: Option<f64>,
    pub rating_deviation: Option<f64>,
    pub rating_lower_bound: Option<f64>,
    pub rating_upper_bound: Option<f64>,
    pub captain_score: Option<f64>,
    pub player_score: Option<f64>,
}

/// One row of the player list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerListing {
    pub id: PlayerId,
    pub alias: String,
    pub platform_id: String,
    pub groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<ListingRatings>,
}

impl PlayerListing {
    /// Full listing when `include_ratings`, otherwise identity and groups only.
    pub fn from_player(player: &Player, include_ratings: bool) -> Self {
        let ratings = include_ratings.then(|| {
            let stats = &player.stats;
            ListingRatings {
                rating_mean: stats.rating.mean.map(|v| round_to(v, 0)),
                rating_deviation: stats.rating.deviation.map(|v| round_to(v, 0)),
                rating_lower_bound: stats.rating.low.map(|v| round_to(v, 0)),
                rating_upper_bound: stats.rating.high.map(|v| round_to(v, 0)),
                captain_score: stats.captain_score.center.map(|v| round_to(v, 3)),
                player_score: stats.player_score.center.map(|v| round_to(v, 3)),
            }
        });

        Self {
            id: player.id.clone(),
            alias: player.alias.clone(),
            platform_id: player.platform_id.clone(),
            groups: player.groups.clone(),
            ratings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RatingStats, ScoreInterval, Stats};

    fn rated_player() -> Player {
        let stats = Stats {
            rating: RatingStats {
                mean: Some(1612.6),
                deviation: Some(84.2),
                low: Some(1528.4),
                high: Some(1696.8),
            },
            captain_score: ScoreInterval::point(0.123456),
            player_score: ScoreInterval::empty(),
            ..Default::default()
        };
        Player::new("p1", "alpha", "7656")
            .with_groups(vec!["admins".to_string()])
            .with_stats(stats)
    }

    #[test]
    fn test_full_listing_rounds() {
        let listing = PlayerListing::from_player(&rated_player(), true);
        let ratings = listing.ratings.unwrap();

        assert_eq!(ratings.rating_mean, Some(1613.0));
        assert_eq!(ratings.rating_deviation, Some(84.0));
        assert_eq!(ratings.rating_lower_bound, Some(1528.0));
        assert_eq!(ratings.rating_upper_bound, Some(1697.0));
        assert_eq!(ratings.captain_score, Some(0.123));
        assert_eq!(ratings.player_score, None);
        assert_eq!(listing.groups, vec!["admins".to_string()]);
    }

    #[test]
    fn test_minimal_listing_omits_ratings() {
        let listing = PlayerListing::from_player(&rated_player(), false);
        assert!(listing.ratings.is_none());

        let json = serde_json::to_string(&listing).unwrap();
        assert!(!json.contains("ratings"));

        let back: PlayerListing = serde_json::from_str(&json).unwrap();
        assert_eq!(back, listing);
    }
}
