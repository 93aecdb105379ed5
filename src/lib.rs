//! Elo Ladder - Elo rankings for a competitive gaming ladder
//!
//! This crate keeps a registry of competitors, game categories and
//! head-to-head match outcomes, derives per-category Elo rankings from the
//! chronological match history, and serves them over a JSON HTTP API.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LadderError, Result};
pub use types::*;

// Re-export key components
pub use rating::{rank, EloRatingEngine, ExtendedEloConfig, RatingComputation, RatingEngine};
pub use service::{AppState, RankingService};
pub use store::{
    CategoryStore, CompetitorStore, InMemoryStore, MatchStore, Snapshot, TournamentResultStore,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
