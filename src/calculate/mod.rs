//! Statistics calculation.
//!
//! Pure arithmetic behind the derived player stats:
//! - Game outcomes and win/loss/tie tallies
//! - Duration-normalized score differentials
//! - Prediction intervals (Student-t based)
//! - Display rounding

mod interval;
mod student_t;

pub use interval::*;
pub use student_t::StudentT;

use crate::models::{Record, Side};

/// Score gap worth one unit of differential.
pub const DIFFERENTIAL_SCALE: f64 = 5.0;

/// Reference game length in seconds.
pub const STANDARD_DURATION_SECS: f64 = 1800.0;

/// Result of a game from one side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

/// Outcome for `side` given the final score.
pub fn outcome(score: [u32; 2], side: Side) -> Outcome {
    let own = score[side.index()];
    let other = score[1 - side.index()];

    match own.cmp(&other) {
        std::cmp::Ordering::Greater => Outcome::Win,
        std::cmp::Ordering::Less => Outcome::Loss,
        std::cmp::Ordering::Equal => Outcome::Tie,
    }
}

/// Tally outcomes into a record.
pub fn tally<I>(outcomes: I) -> Record
where
    I: IntoIterator<Item = Outcome>,
{
    let mut record = Record::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Win => record.win += 1,
            Outcome::Loss => record.loss += 1,
            Outcome::Tie => record.tie += 1,
        }
    }
    record
}

/// Per-game performance differential for `side`.
///
/// `(own - other) / 5`, divided by `duration / 1800`. A missing or zero
/// duration counts as a standard-length game.
pub fn differential(score: [u32; 2], side: Side, duration: Option<f64>) -> f64 {
    let own = score[side.index()] as f64;
    let other = score[1 - side.index()] as f64;
    let gap = (own - other) / DIFFERENTIAL_SCALE;

    let length = match duration {
        Some(secs) if secs != 0.0 && secs.is_finite() => secs / STANDARD_DURATION_SECS,
        _ => 1.0,
    };

    gap / length
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
