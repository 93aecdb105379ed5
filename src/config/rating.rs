//! Rating engine configuration

use crate::rating::ExtendedEloConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Elo parameters and ranking computation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Elo K-factor
    pub k_factor: f64,
    /// Rating a competitor starts at on first appearance
    pub initial_rating: i32,
    /// Deadline for computing one category ranking
    pub computation_timeout_ms: u64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            initial_rating: 1000,
            computation_timeout_ms: 5000,
        }
    }
}

impl RatingConfig {
    /// Engine configuration built from these settings
    pub fn engine_config(&self) -> ExtendedEloConfig {
        ExtendedEloConfig::with_values(self.k_factor, self.initial_rating)
    }

    /// Ranking computation deadline as Duration
    pub fn computation_timeout(&self) -> Duration {
        Duration::from_millis(self.computation_timeout_ms)
    }
}
