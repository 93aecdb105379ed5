//! Common types used throughout the ladder service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for competitors
pub type CompetitorId = String;

/// Unique identifier for categories (game types)
pub type CategoryId = String;

/// Unique identifier for recorded matches
pub type MatchId = String;

/// Unique identifier for tournament placements
pub type TournamentResultId = String;

/// A partition key for ratings; rankings are never merged across categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub url_path: String,
}

/// A player known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: CompetitorId,
    /// Display name, also the ranking tie-breaker
    pub nickname: String,
    pub url_path: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Input for registering a new competitor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCompetitor {
    pub nickname: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub url_path: Option<String>,
}

/// Partial edit of a registered competitor
///
/// An empty `tag` clears it; `aliases` replaces the whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitorUpdate {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub url_path: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
}

/// A recorded head-to-head match between two competitors
///
/// Scores count the games each side won inside the match, so a best-of-5
/// that ended 3-2 is recorded as `score_a = 3, score_b = 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub id: MatchId,
    pub category: CategoryId,
    pub competitor_a: CompetitorId,
    pub competitor_b: CompetitorId,
    pub score_a: u32,
    pub score_b: u32,
    pub played_at: DateTime<Utc>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub tournament: Option<String>,
}

impl MatchOutcome {
    /// Whether the given competitor took part in this match
    pub fn involves(&self, competitor_id: &str) -> bool {
        self.competitor_a == competitor_id || self.competitor_b == competitor_id
    }

    /// Total games played inside the match, widened so no score pair overflows
    pub fn total_games(&self) -> u64 {
        u64::from(self.score_a) + u64::from(self.score_b)
    }

    /// Winner of the match, `None` for a drawn or empty score line
    pub fn winner(&self) -> Option<&CompetitorId> {
        match self.score_a.cmp(&self.score_b) {
            std::cmp::Ordering::Greater => Some(&self.competitor_a),
            std::cmp::Ordering::Less => Some(&self.competitor_b),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Games won by the given competitor, zero if they did not play
    pub fn games_won_by(&self, competitor_id: &str) -> u32 {
        if self.competitor_a == competitor_id {
            self.score_a
        } else if self.competitor_b == competitor_id {
            self.score_b
        } else {
            0
        }
    }
}

/// Input for recording a new match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMatch {
    pub category: CategoryId,
    pub competitor_a: CompetitorId,
    pub competitor_b: CompetitorId,
    pub score_a: u32,
    pub score_b: u32,
    /// Defaults to the time of insertion
    #[serde(default)]
    pub played_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tournament: Option<String>,
}

/// Partial edit of a recorded match
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchUpdate {
    #[serde(default)]
    pub competitor_a: Option<CompetitorId>,
    #[serde(default)]
    pub competitor_b: Option<CompetitorId>,
    #[serde(default)]
    pub score_a: Option<u32>,
    #[serde(default)]
    pub score_b: Option<u32>,
    #[serde(default)]
    pub hidden: Option<bool>,
}

/// Where a competitor was seeded and placed at one tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentResult {
    pub id: TournamentResultId,
    pub competitor_id: CompetitorId,
    pub category: CategoryId,
    pub tournament: String,
    pub held_at: DateTime<Utc>,
    pub seed: u32,
    /// 1 for the winner
    pub placement: u32,
}

/// Input for recording a tournament placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTournamentResult {
    pub competitor_id: CompetitorId,
    pub category: CategoryId,
    pub tournament: String,
    /// Defaults to the time of insertion
    #[serde(default)]
    pub held_at: Option<DateTime<Utc>>,
    pub seed: u32,
    pub placement: u32,
}

/// Correction of a recorded seed or placement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TournamentResultUpdate {
    #[serde(default)]
    pub seed: Option<u32>,
    #[serde(default)]
    pub placement: Option<u32>,
}

/// Current rating of one competitor within one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub competitor_id: CompetitorId,
    pub rating: i32,
    pub matches_played: u32,
    pub match_wins: u32,
    pub match_losses: u32,
    pub games_won: u32,
    pub games_lost: u32,
}

impl RatingRecord {
    /// Fresh record at the given baseline rating
    pub fn new(competitor_id: CompetitorId, initial_rating: i32) -> Self {
        Self {
            competitor_id,
            rating: initial_rating,
            matches_played: 0,
            match_wins: 0,
            match_losses: 0,
            games_won: 0,
            games_lost: 0,
        }
    }
}

/// One row of a display ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based position in the ranking
    pub position: usize,
    pub competitor_id: CompetitorId,
    /// Empty when the competitor could not be resolved in the registry
    pub display_name: String,
    pub rating: i32,
    pub matches_played: u32,
    pub match_wins: u32,
    pub match_losses: u32,
    pub games_won: u32,
    pub games_lost: u32,
}

/// Why an outcome did not take part in a rating computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Both scores were zero, so no result fraction exists
    DegenerateMatch,
    /// Both sides of the match name the same competitor
    SelfMatch,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::DegenerateMatch => "degenerate_match",
            SkipReason::SelfMatch => "self_match",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A data-quality warning produced while computing ratings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedOutcome {
    pub outcome_id: MatchId,
    pub reason: SkipReason,
}
