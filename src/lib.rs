//! # Player Stats
//!
//! Derived player statistics and cached player projections for a pick-up
//! game community.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, games, ratings, restrictions)
//! - **calculate**: Outcome tallies, score differentials, prediction intervals
//! - **storage**: Data source trait and its JSONL-backed implementation
//! - **cache**: Cache store, debounced list projections, player pages
//! - **stats**: Stats aggregation and the update coordinator
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod cache;
pub mod calculate;
pub mod config;
pub mod models;
pub mod stats;
pub mod storage;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "30m", "90s", "250ms").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(n) = s.strip_suffix("ms") {
        let millis: u64 = n.parse().ok()?;
        return Some(Duration::from_millis(millis));
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num * multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_hours() {
        assert_eq!(parse_duration("6h"), Some(Duration::from_secs(21600)));
    }

    #[test]
    fn test_parse_duration_minutes() {
        assert_eq!(parse_duration("30m"), Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_parse_duration_seconds() {
        assert_eq!(parse_duration("90s"), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_parse_duration_millis() {
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("ms"), None);
    }

    #[test]
    fn test_parse_duration_default_seconds() {
        assert_eq!(parse_duration("120"), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("5 minutes"), None);
    }

    #[test]
    fn test_parse_duration_empty() {
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_parse_duration_zero() {
        assert_eq!(parse_duration("0s"), Some(Duration::from_secs(0)));
    }
}
