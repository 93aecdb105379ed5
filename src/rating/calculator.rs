//! Rating engine trait and the computation result it produces
//!
//! The ranking service only talks to ratings through [`RatingEngine`], so the
//! Elo implementation can be swapped for a recording mock in tests.

use crate::types::{CompetitorId, MatchOutcome, RatingRecord, SkippedOutcome};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of replaying a chronological match history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingComputation {
    /// Final rating of every competitor that took part in a counted outcome
    pub ratings: HashMap<CompetitorId, RatingRecord>,
    /// Outcomes that were ignored, in input order
    pub skipped: Vec<SkippedOutcome>,
}

impl RatingComputation {
    /// Rating of a single competitor, if they were rated
    pub fn rating_of(&self, competitor_id: &str) -> Option<i32> {
        self.ratings.get(competitor_id).map(|record| record.rating)
    }
}

/// Trait for computing ratings from an ordered match history
pub trait RatingEngine: Send + Sync {
    /// Replay `outcomes` in the given order and return the final ratings
    ///
    /// # Arguments
    /// * `outcomes` - Match outcomes sorted ascending by `played_at`. The
    ///   engine does not reorder them; Elo updates do not commute.
    fn compute_ratings(&self, outcomes: &[MatchOutcome]) -> RatingComputation;

    /// Rating assigned the first time a competitor appears
    fn initial_rating(&self) -> i32;

    /// Probability-like expected score of side A against side B
    fn expected_score(&self, rating_a: i32, rating_b: i32) -> f64;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;

    /// Update configuration from JSON
    fn update_config(&mut self, config: serde_json::Value) -> crate::error::Result<()>;
}

/// Mock rating engine for testing
///
/// Records every history it is handed and rates each participant at the
/// initial rating without counting anything.
#[derive(Debug, Default)]
pub struct MockRatingEngine {
    calls: std::sync::Mutex<Vec<Vec<MatchOutcome>>>,
    initial_rating: i32,
}

impl MockRatingEngine {
    pub fn new(initial_rating: i32) -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            initial_rating,
        }
    }

    /// Get all histories passed to `compute_ratings` (for testing)
    pub fn get_calls(&self) -> Vec<Vec<MatchOutcome>> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl RatingEngine for MockRatingEngine {
    fn compute_ratings(&self, outcomes: &[MatchOutcome]) -> RatingComputation {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(outcomes.to_vec());
        }

        let mut ratings = HashMap::new();
        for outcome in outcomes {
            for id in [&outcome.competitor_a, &outcome.competitor_b] {
                ratings
                    .entry(id.clone())
                    .or_insert_with(|| RatingRecord::new(id.clone(), self.initial_rating));
            }
        }

        RatingComputation {
            ratings,
            skipped: Vec::new(),
        }
    }

    fn initial_rating(&self) -> i32 {
        self.initial_rating
    }

    fn expected_score(&self, _rating_a: i32, _rating_b: i32) -> f64 {
        0.5
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "mock",
            "initial_rating": self.initial_rating
        })
    }

    fn update_config(&mut self, config: serde_json::Value) -> crate::error::Result<()> {
        if let Some(rating) = config.get("initial_rating").and_then(|v| v.as_i64()) {
            self.initial_rating = i32::try_from(rating).map_err(|_| {
                crate::error::LadderError::ConfigurationError {
                    message: format!("Initial rating {} is out of range", rating),
                }
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn outcome(id: &str, a: &str, b: &str) -> MatchOutcome {
        MatchOutcome {
            id: id.to_string(),
            category: "melee".to_string(),
            competitor_a: a.to_string(),
            competitor_b: b.to_string(),
            score_a: 2,
            score_b: 1,
            played_at: Utc.with_ymd_and_hms(2016, 5, 1, 12, 0, 0).unwrap(),
            hidden: false,
            tournament: None,
        }
    }

    #[test]
    fn test_rating_of() {
        let mut computation = RatingComputation::default();
        computation
            .ratings
            .insert("p1".to_string(), RatingRecord::new("p1".to_string(), 1016));

        assert_eq!(computation.rating_of("p1"), Some(1016));
        assert_eq!(computation.rating_of("p2"), None);
    }

    #[test]
    fn test_mock_engine_records_calls() {
        let engine = MockRatingEngine::new(1000);
        let history = vec![outcome("m1", "p1", "p2"), outcome("m2", "p2", "p3")];

        let result = engine.compute_ratings(&history);

        assert_eq!(result.ratings.len(), 3);
        assert_eq!(result.rating_of("p3"), Some(1000));
        assert!(result.skipped.is_empty());

        let calls = engine.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], history);
    }

    #[test]
    fn test_mock_engine_config() {
        let mut engine = MockRatingEngine::new(1000);
        assert_eq!(engine.config()["type"], "mock");

        engine
            .update_config(serde_json::json!({ "initial_rating": 1200 }))
            .unwrap();
        assert_eq!(engine.initial_rating(), 1200);

        let result = engine.update_config(serde_json::json!({ "initial_rating": 5_000_000_000i64 }));
        assert!(result.is_err());
        assert_eq!(engine.initial_rating(), 1200);
    }
}
