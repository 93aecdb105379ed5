//! Elo rating engine implementation
//!
//! This module replays a chronological match history with the pairwise Elo
//! update rule. Expected scores come from the skillratings crate; the
//! update itself uses the fraction of games won rather than a plain
//! win/loss, so a 3-2 series moves ratings less than a 3-0 sweep.

use crate::rating::calculator::{RatingComputation, RatingEngine};
use crate::types::{MatchOutcome, RatingRecord, SkipReason, SkippedOutcome};
use crate::utils::round_half_up;
use serde::{Deserialize, Serialize};
use skillratings::elo::{EloConfig, EloRating};
use std::collections::HashMap;

/// Extended configuration for the Elo rating engine
/// This wraps the skillratings EloConfig with the baseline rating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedEloConfig {
    /// Core Elo parameters (the K-factor)
    pub elo_config: EloConfig,
    /// Rating given to a competitor on first appearance
    pub initial_rating: i32,
}

impl Default for ExtendedEloConfig {
    fn default() -> Self {
        Self {
            elo_config: EloConfig { k: 32.0 },
            initial_rating: 1000,
        }
    }
}

impl ExtendedEloConfig {
    /// Create conservative configuration (slower rating changes)
    pub fn conservative() -> Self {
        Self {
            elo_config: EloConfig { k: 16.0 },
            initial_rating: 1000,
        }
    }

    /// Create aggressive configuration (faster rating changes)
    pub fn aggressive() -> Self {
        Self {
            elo_config: EloConfig { k: 48.0 },
            initial_rating: 1000,
        }
    }

    /// Build from plain values, as they come out of the application config
    pub fn with_values(k_factor: f64, initial_rating: i32) -> Self {
        Self {
            elo_config: EloConfig { k: k_factor },
            initial_rating,
        }
    }

    /// The K-factor
    pub fn k_factor(&self) -> f64 {
        self.elo_config.k
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        let k = self.elo_config.k;
        if !k.is_finite() || k <= 0.0 {
            return Err(crate::error::LadderError::ConfigurationError {
                message: format!("K-factor must be a positive finite number, got {}", k),
            }
            .into());
        }

        Ok(())
    }
}

/// Elo rating engine
#[derive(Debug, Clone)]
pub struct EloRatingEngine {
    config: ExtendedEloConfig,
}

impl EloRatingEngine {
    /// Create a new Elo rating engine
    pub fn new(config: ExtendedEloConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    /// Current configuration
    pub fn settings(&self) -> &ExtendedEloConfig {
        &self.config
    }

    /// Expected scores of both sides given their current ratings
    ///
    /// The two values always sum to 1.
    pub fn expected_scores(&self, rating_a: i32, rating_b: i32) -> (f64, f64) {
        skillratings::elo::expected_score(
            &EloRating {
                rating: f64::from(rating_a),
            },
            &EloRating {
                rating: f64::from(rating_b),
            },
        )
    }

    /// Ratings of both sides after one match
    ///
    /// `actual_a` is the fraction of games won by side A, in `[0, 1]`.
    pub fn updated_ratings(&self, rating_a: i32, rating_b: i32, actual_a: f64) -> (i32, i32) {
        let k = self.config.elo_config.k;
        let (expected_a, expected_b) = self.expected_scores(rating_a, rating_b);

        let new_a = round_half_up(f64::from(rating_a) + k * (actual_a - expected_a));
        let new_b = round_half_up(f64::from(rating_b) + k * ((1.0 - actual_a) - expected_b));

        (new_a, new_b)
    }

    fn skip_reason(outcome: &MatchOutcome) -> Option<SkipReason> {
        if outcome.competitor_a == outcome.competitor_b {
            Some(SkipReason::SelfMatch)
        } else if outcome.total_games() == 0 {
            Some(SkipReason::DegenerateMatch)
        } else {
            None
        }
    }

    fn record_mut<'a>(
        &self,
        ratings: &'a mut HashMap<String, RatingRecord>,
        competitor_id: &str,
    ) -> &'a mut RatingRecord {
        ratings
            .entry(competitor_id.to_string())
            .or_insert_with(|| {
                RatingRecord::new(competitor_id.to_string(), self.config.initial_rating)
            })
    }

    fn apply(&self, ratings: &mut HashMap<String, RatingRecord>, outcome: &MatchOutcome) {
        let rating_a = self.record_mut(ratings, &outcome.competitor_a).rating;
        let rating_b = self.record_mut(ratings, &outcome.competitor_b).rating;

        let actual_a = f64::from(outcome.score_a) / outcome.total_games() as f64;
        let (new_a, new_b) = self.updated_ratings(rating_a, rating_b, actual_a);

        let a = self.record_mut(ratings, &outcome.competitor_a);
        a.rating = new_a;
        tally(a, outcome.score_a, outcome.score_b);

        let b = self.record_mut(ratings, &outcome.competitor_b);
        b.rating = new_b;
        tally(b, outcome.score_b, outcome.score_a);
    }
}

fn tally(record: &mut RatingRecord, own_score: u32, opponent_score: u32) {
    record.matches_played = record.matches_played.saturating_add(1);
    record.games_won = record.games_won.saturating_add(own_score);
    record.games_lost = record.games_lost.saturating_add(opponent_score);
    if own_score > opponent_score {
        record.match_wins = record.match_wins.saturating_add(1);
    } else if own_score < opponent_score {
        record.match_losses = record.match_losses.saturating_add(1);
    }
}

impl RatingEngine for EloRatingEngine {
    fn compute_ratings(&self, outcomes: &[MatchOutcome]) -> RatingComputation {
        let mut ratings = HashMap::new();
        let mut skipped = Vec::new();

        for outcome in outcomes {
            if let Some(reason) = Self::skip_reason(outcome) {
                skipped.push(SkippedOutcome {
                    outcome_id: outcome.id.clone(),
                    reason,
                });
                continue;
            }

            self.apply(&mut ratings, outcome);
        }

        RatingComputation { ratings, skipped }
    }

    fn initial_rating(&self) -> i32 {
        self.config.initial_rating
    }

    fn expected_score(&self, rating_a: i32, rating_b: i32) -> f64 {
        self.expected_scores(rating_a, rating_b).0
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "elo",
            "k_factor": self.config.elo_config.k,
            "initial_rating": self.config.initial_rating
        })
    }

    fn update_config(&mut self, config: serde_json::Value) -> crate::error::Result<()> {
        let mut updated = self.config.clone();
        if let Some(k) = config.get("k_factor").and_then(|v| v.as_f64()) {
            updated.elo_config.k = k;
        }
        if let Some(rating) = config.get("initial_rating").and_then(|v| v.as_i64()) {
            updated.initial_rating = i32::try_from(rating).map_err(|_| {
                crate::error::LadderError::ConfigurationError {
                    message: format!("Initial rating {} is out of range", rating),
                }
            })?;
        }

        updated.validate()?;
        self.config = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn engine() -> EloRatingEngine {
        EloRatingEngine::new(ExtendedEloConfig::default()).unwrap()
    }

    fn outcome(seq: i64, a: &str, b: &str, score_a: u32, score_b: u32) -> MatchOutcome {
        MatchOutcome {
            id: format!("m{}", seq),
            category: "melee".to_string(),
            competitor_a: a.to_string(),
            competitor_b: b.to_string(),
            score_a,
            score_b,
            played_at: Utc.with_ymd_and_hms(2016, 3, 1, 18, 0, 0).unwrap() + Duration::hours(seq),
            hidden: false,
            tournament: None,
        }
    }

    #[test]
    fn test_sweep_between_fresh_competitors() {
        let result = engine().compute_ratings(&[outcome(1, "armada", "hbox", 2, 0)]);

        assert_eq!(result.rating_of("armada"), Some(1016));
        assert_eq!(result.rating_of("hbox"), Some(984));
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_close_series_moves_less_than_sweep() {
        let close = engine().compute_ratings(&[outcome(1, "a", "b", 3, 2)]);
        let sweep = engine().compute_ratings(&[outcome(1, "a", "b", 3, 0)]);

        // 1000 + 32 * (0.6 - 0.5) = 1003.2
        assert_eq!(close.rating_of("a"), Some(1003));
        assert_eq!(close.rating_of("b"), Some(997));
        assert_eq!(sweep.rating_of("a"), Some(1016));

        let close_delta = close.rating_of("a").unwrap() - 1000;
        let sweep_delta = sweep.rating_of("a").unwrap() - 1000;
        assert!(close_delta.abs() < sweep_delta.abs());
    }

    #[test]
    fn test_expected_scores_sum_to_one() {
        let engine = engine();
        for (a, b) in [(1000, 1000), (1016, 984), (2400, 800), (0, 3000)] {
            let (expected_a, expected_b) = engine.expected_scores(a, b);
            assert!((expected_a + expected_b - 1.0).abs() < 1e-12);
        }

        let (favourite, underdog) = engine.expected_scores(1200, 1000);
        assert!(favourite > 0.75 && favourite < 0.77);
        assert!(underdog < 0.25);
    }

    #[test]
    fn test_order_matters_for_same_pair() {
        let engine = engine();
        let forward = engine.compute_ratings(&[
            outcome(1, "a", "b", 2, 0),
            outcome(2, "a", "b", 0, 2),
        ]);
        let reversed = engine.compute_ratings(&[
            outcome(1, "a", "b", 0, 2),
            outcome(2, "a", "b", 2, 0),
        ]);

        assert_eq!(forward.rating_of("a"), Some(999));
        assert_eq!(forward.rating_of("b"), Some(1001));
        assert_eq!(reversed.rating_of("a"), Some(1001));
        assert_eq!(reversed.rating_of("b"), Some(999));
    }

    #[test]
    fn test_disjoint_pairs_commute() {
        let engine = engine();
        let first = engine.compute_ratings(&[
            outcome(1, "a", "b", 3, 1),
            outcome(2, "c", "d", 0, 3),
        ]);
        let second = engine.compute_ratings(&[
            outcome(1, "c", "d", 0, 3),
            outcome(2, "a", "b", 3, 1),
        ]);

        assert_eq!(first.ratings, second.ratings);
    }

    #[test]
    fn test_degenerate_match_is_skipped() {
        let engine = engine();
        let result = engine.compute_ratings(&[
            outcome(1, "a", "b", 2, 0),
            outcome(2, "a", "b", 0, 0),
        ]);

        assert_eq!(result.rating_of("a"), Some(1016));
        assert_eq!(result.rating_of("b"), Some(984));
        assert_eq!(result.ratings["a"].matches_played, 1);
        assert_eq!(
            result.skipped,
            vec![SkippedOutcome {
                outcome_id: "m2".to_string(),
                reason: SkipReason::DegenerateMatch,
            }]
        );
    }

    #[test]
    fn test_degenerate_first_appearance_does_not_rate() {
        let result = engine().compute_ratings(&[outcome(1, "a", "b", 0, 0)]);

        assert!(result.ratings.is_empty());
        assert_eq!(result.skipped.len(), 1);
    }

    #[test]
    fn test_self_match_is_skipped() {
        let result = engine().compute_ratings(&[outcome(1, "a", "a", 2, 1)]);

        assert!(result.ratings.is_empty());
        assert_eq!(result.skipped[0].reason, SkipReason::SelfMatch);
    }

    #[test]
    fn test_counters() {
        let result = engine().compute_ratings(&[
            outcome(1, "a", "b", 3, 1),
            outcome(2, "b", "a", 2, 2),
            outcome(3, "c", "a", 2, 0),
        ]);

        let a = &result.ratings["a"];
        assert_eq!(a.matches_played, 3);
        assert_eq!(a.match_wins, 1);
        assert_eq!(a.match_losses, 1);
        assert_eq!(a.games_won, 5);
        assert_eq!(a.games_lost, 5);

        let c = &result.ratings["c"];
        assert_eq!(c.matches_played, 1);
        assert_eq!(c.match_wins, 1);
    }

    #[test]
    fn test_extreme_scores_do_not_overflow() {
        let result = engine().compute_ratings(&[
            outcome(1, "a", "b", u32::MAX, 1),
            outcome(2, "a", "b", u32::MAX, u32::MAX),
        ]);

        assert!(result.skipped.is_empty());
        let a = &result.ratings["a"];
        assert_eq!(a.matches_played, 2);
        assert_eq!(a.games_won, u32::MAX);
        assert_eq!(result.ratings["b"].games_lost, u32::MAX);
        assert!(a.rating > 1000);
    }

    #[test]
    fn test_unknown_competitors_absent() {
        let result = engine().compute_ratings(&[outcome(1, "a", "b", 1, 0)]);
        assert_eq!(result.rating_of("c"), None);
        assert_eq!(result.ratings.len(), 2);
    }

    #[test]
    fn test_empty_history() {
        let result = engine().compute_ratings(&[]);
        assert!(result.ratings.is_empty());
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_config_presets() {
        let conservative = ExtendedEloConfig::conservative();
        let aggressive = ExtendedEloConfig::aggressive();
        let default = ExtendedEloConfig::default();

        assert!(conservative.k_factor() < default.k_factor());
        assert!(aggressive.k_factor() > default.k_factor());

        assert!(conservative.validate().is_ok());
        assert!(aggressive.validate().is_ok());
        assert!(default.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        assert!(EloRatingEngine::new(ExtendedEloConfig::with_values(0.0, 1000)).is_err());
        assert!(EloRatingEngine::new(ExtendedEloConfig::with_values(-4.0, 1000)).is_err());
        assert!(EloRatingEngine::new(ExtendedEloConfig::with_values(f64::NAN, 1000)).is_err());
    }

    #[test]
    fn test_update_config() {
        let mut engine = engine();
        engine
            .update_config(serde_json::json!({ "k_factor": 16.0, "initial_rating": 1500 }))
            .unwrap();

        assert_eq!(engine.initial_rating(), 1500);
        assert_eq!(engine.config()["k_factor"], 16.0);

        let result = engine.compute_ratings(&[outcome(1, "a", "b", 1, 0)]);
        assert_eq!(result.rating_of("a"), Some(1508));

        // Invalid updates leave the engine untouched
        assert!(engine
            .update_config(serde_json::json!({ "k_factor": -1.0 }))
            .is_err());
        assert_eq!(engine.settings().k_factor(), 16.0);
    }

    #[test]
    fn test_update_config_rejects_out_of_range_rating() {
        let mut engine = engine();
        let err = engine
            .update_config(serde_json::json!({ "initial_rating": i64::from(i32::MAX) + 1 }))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<crate::error::LadderError>(),
            Some(crate::error::LadderError::ConfigurationError { .. })
        ));
        assert_eq!(engine.initial_rating(), 1000);
    }
}
