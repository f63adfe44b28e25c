//! Core data models.

mod game;
mod ids;
mod listing;
mod page;
mod player;
mod rating;
mod restriction;

pub use game::*;
pub use ids::*;
pub use listing::*;
pub use page::*;
pub use player::*;
pub use rating::*;
pub use restriction::*;
