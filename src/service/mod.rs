//! Service layer for the elo-ladder service
//!
//! This module contains the main application state, the ranking service
//! that runs the rating engine over the store, and health checks.

pub mod app;
pub mod health;
pub mod rankings;

pub use app::{AppState, ServiceError};
pub use health::{HealthCheck, HealthStatus};
pub use rankings::{
    CategoryHistory, CategoryRanking, CompetitorProfile, FaceoffSummary, RankingService,
};
