//! Storage interfaces for categories, competitors and matches
//!
//! The rating engine never touches storage; these traits are what the
//! ranking service and the HTTP layer read from and write to. One in-memory
//! implementation is provided, backed by a JSON snapshot file.

pub mod memory;
pub mod snapshot;

use crate::types::{
    Category, Competitor, CompetitorId, CompetitorUpdate, MatchOutcome, MatchUpdate,
    NewCompetitor, NewMatch, NewTournamentResult, TournamentResult, TournamentResultUpdate,
};

pub use memory::InMemoryStore;
pub use snapshot::Snapshot;

/// Trait for category (game type) operations
pub trait CategoryStore: Send + Sync {
    /// Create a category; its URL path is derived from the name
    fn add_category(&self, name: &str) -> crate::error::Result<Category>;

    /// Get a category by ID
    fn get_category(&self, id: &str) -> crate::error::Result<Option<Category>>;

    /// Get a category by URL path
    fn find_category_by_path(&self, url_path: &str) -> crate::error::Result<Option<Category>>;

    /// All categories sorted by name
    fn list_categories(&self) -> crate::error::Result<Vec<Category>>;
}

/// Trait for the competitor registry
pub trait CompetitorStore: Send + Sync {
    /// Register a competitor, deriving a unique URL path
    fn add_competitor(&self, competitor: NewCompetitor) -> crate::error::Result<Competitor>;

    /// Edit nickname, URL path, tag or aliases
    ///
    /// A URL path held by another competitor is rejected.
    fn update_competitor(&self, id: &str, update: CompetitorUpdate)
        -> crate::error::Result<Competitor>;

    /// Get a competitor by ID
    fn get_competitor(&self, id: &str) -> crate::error::Result<Option<Competitor>>;

    /// Get a competitor by URL path
    fn find_competitor_by_path(&self, url_path: &str)
        -> crate::error::Result<Option<Competitor>>;

    /// All competitors sorted by nickname
    fn list_competitors(&self) -> crate::error::Result<Vec<Competitor>>;

    /// Case-insensitive nickname search, sorted by nickname
    fn search_competitors(&self, query: &str, limit: usize)
        -> crate::error::Result<Vec<Competitor>>;

    /// Move every match and tournament result of `merge` onto `keep` and
    /// delete `merge`
    ///
    /// Returns the number of matches reassigned.
    fn merge_competitors(&self, keep: &CompetitorId, merge: &CompetitorId)
        -> crate::error::Result<usize>;
}

/// Trait for match history operations
pub trait MatchStore: Send + Sync {
    /// Record a match between two distinct, registered competitors
    fn add_match(&self, new_match: NewMatch) -> crate::error::Result<MatchOutcome>;

    /// Get a match by ID
    fn get_match(&self, id: &str) -> crate::error::Result<Option<MatchOutcome>>;

    /// Edit players, scores or visibility of a recorded match
    fn update_match(&self, id: &str, update: MatchUpdate) -> crate::error::Result<MatchOutcome>;

    /// Matches of one category, ascending by date; ties keep insertion order
    fn matches_for_category(
        &self,
        category: &str,
        include_hidden: bool,
    ) -> crate::error::Result<Vec<MatchOutcome>>;

    /// Matches one competitor took part in, newest first
    fn matches_for_competitor(
        &self,
        competitor_id: &str,
        include_hidden: bool,
    ) -> crate::error::Result<Vec<MatchOutcome>>;

    /// Matches between two competitors in either seating, ascending by date
    fn matches_between(
        &self,
        first: &str,
        second: &str,
        include_hidden: bool,
    ) -> crate::error::Result<Vec<MatchOutcome>>;

    /// Total number of recorded matches
    fn match_count(&self) -> crate::error::Result<usize>;
}

/// Trait for tournament placements
pub trait TournamentResultStore: Send + Sync {
    /// Record where a registered competitor placed at a tournament
    fn add_tournament_result(
        &self,
        result: NewTournamentResult,
    ) -> crate::error::Result<TournamentResult>;

    /// Correct the seed or placement of a recorded result
    fn update_tournament_result(
        &self,
        id: &str,
        update: TournamentResultUpdate,
    ) -> crate::error::Result<TournamentResult>;

    /// Results of one competitor, most recent tournament first
    fn results_for_competitor(
        &self,
        competitor_id: &str,
    ) -> crate::error::Result<Vec<TournamentResult>>;

    /// Standings of one tournament, best placement first
    fn results_for_tournament(&self, tournament: &str)
        -> crate::error::Result<Vec<TournamentResult>>;
}
