//! Error types for the ladder service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific ladder scenarios
#[derive(Debug, thiserror::Error)]
pub enum LadderError {
    #[error("Competitor not found: {competitor_id}")]
    CompetitorNotFound { competitor_id: String },

    #[error("Category not found: {category}")]
    CategoryNotFound { category: String },

    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("Tournament result not found: {result_id}")]
    TournamentResultNotFound { result_id: String },

    #[error("URL path already in use: {url_path}")]
    UrlPathTaken { url_path: String },

    #[error("Invalid match: {reason}")]
    InvalidMatch { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Category already exists: {name}")]
    DuplicateCategory { name: String },

    #[error("Invalid merge: {reason}")]
    InvalidMerge { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Snapshot error: {message}")]
    SnapshotError { message: String },

    #[error("Ranking computation for {category} timed out after {timeout_ms}ms")]
    ComputationTimeout { category: String, timeout_ms: u64 },
}

impl LadderError {
    /// Lock poisoning is the only way the in-memory store can fail
    pub(crate) fn lock_poisoned(kind: &str) -> Self {
        LadderError::StorageError {
            message: format!("Failed to acquire {} lock", kind),
        }
    }
}
