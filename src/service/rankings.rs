//! Ranking service
//!
//! Reads a category's visible match history from the store in chronological
//! order, replays it through the rating engine and resolves display names.
//! Nothing is cached; every call recomputes from the full history.

use crate::error::{LadderError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::{rank, RatingComputation, RatingEngine};
use crate::store::{
    CategoryStore, CompetitorStore, InMemoryStore, MatchStore, TournamentResultStore,
};
use crate::types::{
    Category, CategoryId, Competitor, CompetitorId, MatchOutcome, RankedEntry, SkippedOutcome,
    TournamentResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Ranking of one category at the time it was computed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRanking {
    pub category: Category,
    pub entries: Vec<RankedEntry>,
    /// Outcomes the engine could not use
    pub skipped: Vec<SkippedOutcome>,
    pub computed_at: DateTime<Utc>,
}

/// Head-to-head record of two competitors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceoffSummary {
    pub competitor_a: Competitor,
    pub competitor_b: Competitor,
    /// Set when the faceoff was restricted to one category
    pub category: Option<Category>,
    /// Visible matches between the two, oldest first
    pub matches: Vec<MatchOutcome>,
    pub match_wins_a: u32,
    pub match_wins_b: u32,
    pub game_wins_a: u32,
    pub game_wins_b: u32,
    /// Current ratings in the category; `None` when unrated there
    pub rating_a: Option<i32>,
    pub rating_b: Option<i32>,
    /// Expected score of A against B from the current ratings
    pub expected_score_a: Option<f64>,
}

/// A competitor's matches within one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryHistory {
    pub category_id: CategoryId,
    /// Empty when the category is not in the store
    pub category_name: String,
    pub rating: Option<i32>,
    pub position: Option<usize>,
    /// Newest first
    pub matches: Vec<MatchOutcome>,
}

/// Everything shown on a competitor's page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorProfile {
    pub competitor: Competitor,
    /// Categories in the order of the competitor's most recent match in each
    pub categories: Vec<CategoryHistory>,
}

/// Computes rankings and derived views from the store
pub struct RankingService {
    engine: Arc<dyn RatingEngine>,
    store: Arc<InMemoryStore>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl RankingService {
    /// Create a ranking service without metrics
    pub fn new(engine: Arc<dyn RatingEngine>, store: Arc<InMemoryStore>) -> Self {
        Self {
            engine,
            store,
            metrics: None,
        }
    }

    /// Create a ranking service that reports to the given collector
    pub fn with_metrics(
        engine: Arc<dyn RatingEngine>,
        store: Arc<InMemoryStore>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            engine,
            store,
            metrics: Some(metrics),
        }
    }

    /// The engine in use
    pub fn engine(&self) -> &Arc<dyn RatingEngine> {
        &self.engine
    }

    /// Ranking of the category with the given ID
    pub fn rankings_for_category(&self, category_id: &str) -> Result<CategoryRanking> {
        let category =
            self.store
                .get_category(category_id)?
                .ok_or_else(|| LadderError::CategoryNotFound {
                    category: category_id.to_string(),
                })?;

        self.rank_category(category)
    }

    /// Ranking of the category with the given URL path
    pub fn rankings_by_path(&self, url_path: &str) -> Result<CategoryRanking> {
        let category = self.resolve_category_path(url_path)?;
        self.rank_category(category)
    }

    /// Look up a category by URL path, failing when it is unknown
    pub fn resolve_category_path(&self, url_path: &str) -> Result<Category> {
        self.store
            .find_category_by_path(url_path)?
            .ok_or_else(|| {
                LadderError::CategoryNotFound {
                    category: url_path.to_string(),
                }
                .into()
            })
    }

    /// Head-to-head summary of two competitors
    ///
    /// With a category, only matches in that category count and both
    /// competitors' current ratings there are attached.
    pub fn faceoff(
        &self,
        competitor_a: &str,
        competitor_b: &str,
        category_id: Option<&str>,
    ) -> Result<FaceoffSummary> {
        if competitor_a == competitor_b {
            return Err(LadderError::InvalidInput {
                reason: "a faceoff needs two different competitors".to_string(),
            }
            .into());
        }

        let a = self.require_competitor(competitor_a)?;
        let b = self.require_competitor(competitor_b)?;
        let category = match category_id {
            Some(id) => Some(self.store.get_category(id)?.ok_or_else(|| {
                LadderError::CategoryNotFound {
                    category: id.to_string(),
                }
            })?),
            None => None,
        };

        let matches: Vec<MatchOutcome> = self
            .store
            .matches_between(&a.id, &b.id, false)?
            .into_iter()
            .filter(|m| category.as_ref().map_or(true, |c| m.category == c.id))
            .collect();

        let mut summary = FaceoffSummary {
            competitor_a: a,
            competitor_b: b,
            category: None,
            match_wins_a: 0,
            match_wins_b: 0,
            game_wins_a: 0,
            game_wins_b: 0,
            matches: Vec::new(),
            rating_a: None,
            rating_b: None,
            expected_score_a: None,
        };

        for m in &matches {
            match m.winner() {
                Some(winner) if *winner == summary.competitor_a.id => summary.match_wins_a += 1,
                Some(_) => summary.match_wins_b += 1,
                None => {}
            }
            summary.game_wins_a = summary
                .game_wins_a
                .saturating_add(m.games_won_by(&summary.competitor_a.id));
            summary.game_wins_b = summary
                .game_wins_b
                .saturating_add(m.games_won_by(&summary.competitor_b.id));
        }
        summary.matches = matches;

        if let Some(category) = category {
            let computation = self.compute(&category.id)?;
            summary.rating_a = computation.rating_of(&summary.competitor_a.id);
            summary.rating_b = computation.rating_of(&summary.competitor_b.id);

            let initial = self.engine.initial_rating();
            summary.expected_score_a = Some(self.engine.expected_score(
                summary.rating_a.unwrap_or(initial),
                summary.rating_b.unwrap_or(initial),
            ));
            summary.category = Some(category);
        }

        Ok(summary)
    }

    /// A competitor with their matches grouped per category
    pub fn competitor_profile(
        &self,
        competitor_id: &str,
        include_hidden: bool,
    ) -> Result<CompetitorProfile> {
        let competitor = self.require_competitor(competitor_id)?;
        let matches = self
            .store
            .matches_for_competitor(&competitor.id, include_hidden)?;

        let mut groups: Vec<(CategoryId, Vec<MatchOutcome>)> = Vec::new();
        for m in matches {
            match groups.iter_mut().find(|(id, _)| *id == m.category) {
                Some((_, group)) => group.push(m),
                None => groups.push((m.category.clone(), vec![m])),
            }
        }

        let mut categories = Vec::with_capacity(groups.len());
        for (category_id, matches) in groups {
            let (category_name, rating, position) = match self.store.get_category(&category_id)? {
                Some(category) => {
                    let ranking = self.rank_category(category.clone())?;
                    let entry = ranking
                        .entries
                        .iter()
                        .find(|e| e.competitor_id == competitor.id);
                    (
                        category.name,
                        entry.map(|e| e.rating),
                        entry.map(|e| e.position),
                    )
                }
                None => {
                    warn!(
                        "Competitor {} has matches in unknown category {}",
                        competitor.id, category_id
                    );
                    (String::new(), None, None)
                }
            };

            categories.push(CategoryHistory {
                category_id,
                category_name,
                rating,
                position,
                matches,
            });
        }

        Ok(CompetitorProfile {
            competitor,
            categories,
        })
    }

    /// Visible matches of a competitor, newest first, optionally in one category
    pub fn competitor_matches(
        &self,
        competitor_id: &str,
        category_id: Option<&str>,
    ) -> Result<Vec<MatchOutcome>> {
        let competitor = self.require_competitor(competitor_id)?;

        Ok(self
            .store
            .matches_for_competitor(&competitor.id, false)?
            .into_iter()
            .filter(|m| category_id.map_or(true, |c| m.category == c))
            .collect())
    }

    /// Tournament placements of a competitor, most recent first, optionally in one category
    pub fn competitor_results(
        &self,
        competitor_id: &str,
        category_id: Option<&str>,
    ) -> Result<Vec<TournamentResult>> {
        let competitor = self.require_competitor(competitor_id)?;

        Ok(self
            .store
            .results_for_competitor(&competitor.id)?
            .into_iter()
            .filter(|r| category_id.map_or(true, |c| r.category == c))
            .collect())
    }

    /// Run a computation on the blocking pool, abandoning it at the deadline
    ///
    /// A computation that misses the deadline keeps running to completion on
    /// its thread but its result is dropped.
    pub async fn within_deadline<T, F>(
        self: &Arc<Self>,
        label: &str,
        deadline: Duration,
        work: F,
    ) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&RankingService) -> Result<T> + Send + 'static,
    {
        let service = Arc::clone(self);
        let task = tokio::task::spawn_blocking(move || work(&service));

        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(anyhow::anyhow!("Ranking task failed: {}", e)),
            Err(_) => {
                warn!("Computation for {} exceeded {:?}", label, deadline);
                if let Some(metrics) = &self.metrics {
                    metrics.record_ranking_timeout();
                }
                Err(LadderError::ComputationTimeout {
                    category: label.to_string(),
                    timeout_ms: deadline.as_millis() as u64,
                }
                .into())
            }
        }
    }

    fn require_competitor(&self, competitor_id: &str) -> Result<Competitor> {
        self.store.get_competitor(competitor_id)?.ok_or_else(|| {
            LadderError::CompetitorNotFound {
                competitor_id: competitor_id.to_string(),
            }
            .into()
        })
    }

    fn compute(&self, category_id: &str) -> Result<RatingComputation> {
        let history = self.store.matches_for_category(category_id, false)?;
        let computation = self.engine.compute_ratings(&history);

        for skipped in &computation.skipped {
            warn!(
                "Skipped match {} in category {}: {}",
                skipped.outcome_id, category_id, skipped.reason
            );
        }

        Ok(computation)
    }

    fn rank_category(&self, category: Category) -> Result<CategoryRanking> {
        let started = std::time::Instant::now();
        let computation = self.compute(&category.id)?;

        let names: HashMap<CompetitorId, String> = self
            .store
            .list_competitors()?
            .into_iter()
            .map(|c| (c.id, c.nickname))
            .collect();

        let entries = rank(&computation.ratings, |id| {
            let name = names.get(id).cloned();
            if name.is_none() {
                warn!("Competitor {} in {} is not registered", id, category.name);
            }
            name
        });

        let elapsed = started.elapsed();
        debug!(
            "Ranked {} competitors in {} from history in {:?}",
            entries.len(),
            category.name,
            elapsed
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_ranking(&category.url_path, entries.len(), &computation.skipped, elapsed);
        }

        Ok(CategoryRanking {
            category,
            entries,
            skipped: computation.skipped,
            computed_at: Utc::now(),
        })
    }
}
