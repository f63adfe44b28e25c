//! Player restrictions (bans, captaincy locks).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub user: PlayerId,
    pub active: bool,

    /// Restricted activities, e.g. "play", "captain"
    #[serde(default)]
    pub aspects: Vec<String>,

    #[serde(default)]
    pub reason: Option<String>,

    /// None means the restriction does not expire
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

impl Restriction {
    /// Page order: active first, then soonest-expiring, permanent last.
    pub fn page_order(a: &Restriction, b: &Restriction) -> Ordering {
        b.active
            .cmp(&a.active)
            .then_with(|| match (a.expires, b.expires) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn restriction(active: bool, expires_day: Option<u32>) -> Restriction {
        Restriction {
            user: "p1".into(),
            active,
            aspects: vec!["play".to_string()],
            reason: None,
            expires: expires_day.map(|d| Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_page_order() {
        let mut restrictions = vec![
            restriction(false, Some(1)),
            restriction(true, None),
            restriction(true, Some(20)),
            restriction(true, Some(5)),
        ];
        restrictions.sort_by(Restriction::page_order);

        assert!(restrictions[0].active && restrictions[0].expires.is_some());
        assert_eq!(restrictions[0].expires, restriction(true, Some(5)).expires);
        assert_eq!(restrictions[1].expires, restriction(true, Some(20)).expires);
        assert_eq!(restrictions[2].expires, None);
        assert!(!restrictions[3].active);
    }
}
