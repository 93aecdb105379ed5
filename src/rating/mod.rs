//! Rating system using the Elo pairwise update rule
//!
//! This module provides the rating engine interface, the Elo engine that
//! replays a chronological match history, and the ranking sort applied to
//! its output.

pub mod calculator;
pub mod elo;
pub mod ranking;

// Re-export commonly used types
pub use calculator::{MockRatingEngine, RatingComputation, RatingEngine};
pub use elo::{EloRatingEngine, ExtendedEloConfig};
pub use ranking::rank;
