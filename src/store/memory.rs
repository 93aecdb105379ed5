//! In-memory store implementation
//!
//! All three store traits are served from one lock so that merges and match
//! edits see a consistent registry.

use crate::error::LadderError;
use crate::store::{CategoryStore, CompetitorStore, MatchStore, Snapshot, TournamentResultStore};
use crate::types::{
    Category, Competitor, CompetitorId, CompetitorUpdate, MatchOutcome, MatchUpdate,
    NewCompetitor, NewMatch, NewTournamentResult, TournamentResult, TournamentResultUpdate,
};
use crate::utils::{current_timestamp, generate_id, slugify};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct StoreInner {
    categories: Vec<Category>,
    competitors: HashMap<CompetitorId, Competitor>,
    /// Insertion order, which breaks ties between equal timestamps
    matches: Vec<MatchOutcome>,
    tournament_results: Vec<TournamentResult>,
}

impl StoreInner {
    fn url_path_taken(&self, url_path: &str) -> bool {
        self.competitors.values().any(|c| c.url_path == url_path)
    }

    fn url_path_taken_by_other(&self, url_path: &str, id: &str) -> bool {
        self.competitors
            .values()
            .any(|c| c.url_path == url_path && c.id != id)
    }

    fn require_category(&self, id: &str) -> crate::error::Result<()> {
        if self.categories.iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(LadderError::CategoryNotFound {
                category: id.to_string(),
            }
            .into())
        }
    }

    fn require_competitor(&self, id: &str) -> crate::error::Result<()> {
        if self.competitors.contains_key(id) {
            Ok(())
        } else {
            Err(LadderError::CompetitorNotFound {
                competitor_id: id.to_string(),
            }
            .into())
        }
    }

    fn validate_pairing(&self, a: &str, b: &str) -> crate::error::Result<()> {
        if a == b {
            return Err(LadderError::InvalidMatch {
                reason: format!("competitor {} cannot play against themselves", a),
            }
            .into());
        }
        self.require_competitor(a)?;
        self.require_competitor(b)
    }
}

fn validate_placement(placement: u32) -> crate::error::Result<()> {
    if placement == 0 {
        return Err(LadderError::InvalidInput {
            reason: "placement starts at 1".to_string(),
        }
        .into());
    }
    Ok(())
}

fn validate_scores(score_a: u32, score_b: u32) -> crate::error::Result<()> {
    if score_a.checked_add(score_b).is_none() {
        return Err(LadderError::InvalidMatch {
            reason: format!("score {}:{} is out of range", score_a, score_b),
        }
        .into());
    }
    Ok(())
}

/// In-memory store for categories, competitors and matches
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the snapshot's records as they are
    ///
    /// Matches referencing unknown competitors are kept; the rating engine
    /// keys on IDs and name resolution degrades at display time.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let competitors: HashMap<_, _> = snapshot
            .competitors
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        let dangling = snapshot
            .matches
            .iter()
            .filter(|m| {
                !competitors.contains_key(&m.competitor_a)
                    || !competitors.contains_key(&m.competitor_b)
            })
            .count();
        if dangling > 0 {
            warn!(
                "Snapshot contains {} matches referencing unknown competitors",
                dangling
            );
        }

        Self {
            inner: RwLock::new(StoreInner {
                categories: snapshot.categories,
                competitors,
                matches: snapshot.matches,
                tournament_results: snapshot.tournament_results,
            }),
        }
    }

    /// Copy the current contents into a snapshot
    pub fn snapshot(&self) -> crate::error::Result<Snapshot> {
        let inner = self.read()?;

        let mut competitors: Vec<Competitor> = inner.competitors.values().cloned().collect();
        competitors.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(Snapshot {
            categories: inner.categories.clone(),
            competitors,
            matches: inner.matches.clone(),
            tournament_results: inner.tournament_results.clone(),
        })
    }

    /// Create a store from a JSON snapshot file
    pub fn load_snapshot(path: &Path) -> crate::error::Result<Self> {
        Ok(Self::from_snapshot(Snapshot::load(path)?))
    }

    /// Write the current contents to a JSON snapshot file
    pub fn save_snapshot(&self, path: &Path) -> crate::error::Result<()> {
        self.snapshot()?.save(path)
    }

    /// Number of registered competitors
    pub fn competitor_count(&self) -> crate::error::Result<usize> {
        Ok(self.read()?.competitors.len())
    }

    fn read(&self) -> crate::error::Result<RwLockReadGuard<'_, StoreInner>> {
        self.inner
            .read()
            .map_err(|_| LadderError::lock_poisoned("store read").into())
    }

    fn write(&self) -> crate::error::Result<RwLockWriteGuard<'_, StoreInner>> {
        self.inner
            .write()
            .map_err(|_| LadderError::lock_poisoned("store write").into())
    }
}

impl CategoryStore for InMemoryStore {
    fn add_category(&self, name: &str) -> crate::error::Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LadderError::InvalidInput {
                reason: "category name cannot be empty".to_string(),
            }
            .into());
        }

        let mut inner = self.write()?;
        let id = generate_id();
        let slug = slugify(name);
        let url_path = if slug.is_empty() { id.clone() } else { slug };

        if inner
            .categories
            .iter()
            .any(|c| c.url_path == url_path || c.name == name)
        {
            return Err(LadderError::DuplicateCategory {
                name: name.to_string(),
            }
            .into());
        }

        let category = Category {
            id,
            name: name.to_string(),
            url_path,
        };
        inner.categories.push(category.clone());
        debug!("Added category '{}' ({})", category.name, category.id);

        Ok(category)
    }

    fn get_category(&self, id: &str) -> crate::error::Result<Option<Category>> {
        let inner = self.read()?;
        Ok(inner.categories.iter().find(|c| c.id == id).cloned())
    }

    fn find_category_by_path(&self, url_path: &str) -> crate::error::Result<Option<Category>> {
        let inner = self.read()?;
        Ok(inner
            .categories
            .iter()
            .find(|c| c.url_path == url_path)
            .cloned())
    }

    fn list_categories(&self) -> crate::error::Result<Vec<Category>> {
        let mut categories = self.read()?.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

impl CompetitorStore for InMemoryStore {
    fn add_competitor(&self, competitor: NewCompetitor) -> crate::error::Result<Competitor> {
        let nickname = competitor.nickname.trim().to_string();
        if nickname.is_empty() {
            return Err(LadderError::InvalidInput {
                reason: "nickname cannot be empty".to_string(),
            }
            .into());
        }

        let mut inner = self.write()?;
        let id = generate_id();

        // A requested or derived path that is empty or already taken falls back to the ID
        let candidate = competitor
            .url_path
            .map(|p| slugify(&p))
            .unwrap_or_else(|| slugify(&nickname));
        let url_path = if candidate.is_empty() || inner.url_path_taken(&candidate) {
            id.clone()
        } else {
            candidate
        };

        let created = Competitor {
            id: id.clone(),
            nickname,
            url_path,
            tag: competitor.tag.filter(|t| !t.trim().is_empty()),
            aliases: Vec::new(),
        };
        inner.competitors.insert(id, created.clone());
        debug!(
            "Added competitor '{}' at /{}",
            created.nickname, created.url_path
        );

        Ok(created)
    }

    fn update_competitor(
        &self,
        id: &str,
        update: CompetitorUpdate,
    ) -> crate::error::Result<Competitor> {
        let mut inner = self.write()?;
        let mut edited = inner
            .competitors
            .get(id)
            .cloned()
            .ok_or_else(|| LadderError::CompetitorNotFound {
                competitor_id: id.to_string(),
            })?;

        if let Some(nickname) = update.nickname {
            let nickname = nickname.trim().to_string();
            if nickname.is_empty() {
                return Err(LadderError::InvalidInput {
                    reason: "nickname cannot be empty".to_string(),
                }
                .into());
            }
            edited.nickname = nickname;
        }
        if let Some(requested) = update.url_path {
            let url_path = slugify(&requested);
            if url_path.is_empty() {
                return Err(LadderError::InvalidInput {
                    reason: format!("'{}' is not a usable URL path", requested),
                }
                .into());
            }
            if inner.url_path_taken_by_other(&url_path, id) {
                return Err(LadderError::UrlPathTaken { url_path }.into());
            }
            edited.url_path = url_path;
        }
        if let Some(tag) = update.tag {
            let tag = tag.trim().to_string();
            edited.tag = if tag.is_empty() { None } else { Some(tag) };
        }
        if let Some(aliases) = update.aliases {
            edited.aliases = aliases
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();
        }

        inner.competitors.insert(edited.id.clone(), edited.clone());
        debug!("Updated competitor '{}' ({})", edited.nickname, edited.id);

        Ok(edited)
    }

    fn get_competitor(&self, id: &str) -> crate::error::Result<Option<Competitor>> {
        Ok(self.read()?.competitors.get(id).cloned())
    }

    fn find_competitor_by_path(
        &self,
        url_path: &str,
    ) -> crate::error::Result<Option<Competitor>> {
        let inner = self.read()?;
        Ok(inner
            .competitors
            .values()
            .find(|c| c.url_path == url_path)
            .cloned())
    }

    fn list_competitors(&self) -> crate::error::Result<Vec<Competitor>> {
        let mut competitors: Vec<Competitor> =
            self.read()?.competitors.values().cloned().collect();
        competitors.sort_by(|a, b| a.nickname.cmp(&b.nickname).then_with(|| a.id.cmp(&b.id)));
        Ok(competitors)
    }

    fn search_competitors(
        &self,
        query: &str,
        limit: usize,
    ) -> crate::error::Result<Vec<Competitor>> {
        let needle = query.to_lowercase();
        let mut matching: Vec<Competitor> = self
            .list_competitors()?
            .into_iter()
            .filter(|c| c.nickname.to_lowercase().contains(&needle))
            .collect();

        matching.truncate(limit);
        Ok(matching)
    }

    fn merge_competitors(
        &self,
        keep: &CompetitorId,
        merge: &CompetitorId,
    ) -> crate::error::Result<usize> {
        if keep == merge {
            return Err(LadderError::InvalidMerge {
                reason: "cannot merge a competitor into themselves".to_string(),
            }
            .into());
        }

        let mut inner = self.write()?;
        inner.require_competitor(keep)?;
        inner.require_competitor(merge)?;

        let mut reassigned = 0;
        for m in inner.matches.iter_mut().filter(|m| m.involves(merge)) {
            if &m.competitor_a == merge {
                m.competitor_a = keep.clone();
            }
            if &m.competitor_b == merge {
                m.competitor_b = keep.clone();
            }
            if m.competitor_a == m.competitor_b {
                warn!("Match {} became a self-match after merge, hiding it", m.id);
                m.hidden = true;
            }
            reassigned += 1;
        }

        let mut moved_results = 0;
        for result in inner
            .tournament_results
            .iter_mut()
            .filter(|r| &r.competitor_id == merge)
        {
            result.competitor_id = keep.clone();
            moved_results += 1;
        }
        debug!(
            "Merged {} into {}: {} matches, {} tournament results",
            merge, keep, reassigned, moved_results
        );

        if let Some(merged) = inner.competitors.remove(merge) {
            if let Some(kept) = inner.competitors.get_mut(keep) {
                if !kept.aliases.contains(&merged.nickname) && kept.nickname != merged.nickname {
                    kept.aliases.push(merged.nickname);
                }
            }
        }

        Ok(reassigned)
    }
}

impl MatchStore for InMemoryStore {
    fn add_match(&self, new_match: NewMatch) -> crate::error::Result<MatchOutcome> {
        validate_scores(new_match.score_a, new_match.score_b)?;

        let mut inner = self.write()?;
        inner.validate_pairing(&new_match.competitor_a, &new_match.competitor_b)?;
        inner.require_category(&new_match.category)?;

        let outcome = MatchOutcome {
            id: generate_id(),
            category: new_match.category,
            competitor_a: new_match.competitor_a,
            competitor_b: new_match.competitor_b,
            score_a: new_match.score_a,
            score_b: new_match.score_b,
            played_at: new_match.played_at.unwrap_or_else(current_timestamp),
            hidden: false,
            tournament: new_match.tournament,
        };
        inner.matches.push(outcome.clone());
        debug!(
            "Recorded match {} - {} {}:{} {}",
            outcome.id,
            outcome.competitor_a,
            outcome.score_a,
            outcome.score_b,
            outcome.competitor_b
        );

        Ok(outcome)
    }

    fn get_match(&self, id: &str) -> crate::error::Result<Option<MatchOutcome>> {
        Ok(self.read()?.matches.iter().find(|m| m.id == id).cloned())
    }

    fn update_match(&self, id: &str, update: MatchUpdate) -> crate::error::Result<MatchOutcome> {
        let mut inner = self.write()?;
        let idx = inner
            .matches
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| LadderError::MatchNotFound {
                match_id: id.to_string(),
            })?;

        let mut edited = inner.matches[idx].clone();
        if let Some(a) = update.competitor_a {
            edited.competitor_a = a;
        }
        if let Some(b) = update.competitor_b {
            edited.competitor_b = b;
        }
        if let Some(score) = update.score_a {
            edited.score_a = score;
        }
        if let Some(score) = update.score_b {
            edited.score_b = score;
        }
        if let Some(hidden) = update.hidden {
            edited.hidden = hidden;
        }

        inner.validate_pairing(&edited.competitor_a, &edited.competitor_b)?;
        validate_scores(edited.score_a, edited.score_b)?;
        inner.matches[idx] = edited.clone();

        Ok(edited)
    }

    fn matches_for_category(
        &self,
        category: &str,
        include_hidden: bool,
    ) -> crate::error::Result<Vec<MatchOutcome>> {
        let mut matches: Vec<MatchOutcome> = self
            .read()?
            .matches
            .iter()
            .filter(|m| m.category == category && (include_hidden || !m.hidden))
            .cloned()
            .collect();

        // Stable sort keeps insertion order for equal timestamps
        matches.sort_by_key(|m| m.played_at);
        Ok(matches)
    }

    fn matches_for_competitor(
        &self,
        competitor_id: &str,
        include_hidden: bool,
    ) -> crate::error::Result<Vec<MatchOutcome>> {
        let mut matches: Vec<MatchOutcome> = self
            .read()?
            .matches
            .iter()
            .filter(|m| m.involves(competitor_id) && (include_hidden || !m.hidden))
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.played_at.cmp(&a.played_at));
        Ok(matches)
    }

    fn matches_between(
        &self,
        first: &str,
        second: &str,
        include_hidden: bool,
    ) -> crate::error::Result<Vec<MatchOutcome>> {
        let mut matches: Vec<MatchOutcome> = self
            .read()?
            .matches
            .iter()
            .filter(|m| m.involves(first) && m.involves(second) && first != second)
            .filter(|m| include_hidden || !m.hidden)
            .cloned()
            .collect();

        matches.sort_by_key(|m| m.played_at);
        Ok(matches)
    }

    fn match_count(&self) -> crate::error::Result<usize> {
        Ok(self.read()?.matches.len())
    }
}

impl TournamentResultStore for InMemoryStore {
    fn add_tournament_result(
        &self,
        result: NewTournamentResult,
    ) -> crate::error::Result<TournamentResult> {
        let tournament = result.tournament.trim().to_string();
        if tournament.is_empty() {
            return Err(LadderError::InvalidInput {
                reason: "tournament name cannot be empty".to_string(),
            }
            .into());
        }
        validate_placement(result.placement)?;

        let mut inner = self.write()?;
        inner.require_competitor(&result.competitor_id)?;
        inner.require_category(&result.category)?;

        let recorded = TournamentResult {
            id: generate_id(),
            competitor_id: result.competitor_id,
            category: result.category,
            tournament,
            held_at: result.held_at.unwrap_or_else(current_timestamp),
            seed: result.seed,
            placement: result.placement,
        };
        inner.tournament_results.push(recorded.clone());
        debug!(
            "Recorded placement {} at {} for {}",
            recorded.placement, recorded.tournament, recorded.competitor_id
        );

        Ok(recorded)
    }

    fn update_tournament_result(
        &self,
        id: &str,
        update: TournamentResultUpdate,
    ) -> crate::error::Result<TournamentResult> {
        let mut inner = self.write()?;
        let result = inner
            .tournament_results
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| LadderError::TournamentResultNotFound {
                result_id: id.to_string(),
            })?;

        if let Some(placement) = update.placement {
            validate_placement(placement)?;
            result.placement = placement;
        }
        if let Some(seed) = update.seed {
            result.seed = seed;
        }

        Ok(result.clone())
    }

    fn results_for_competitor(
        &self,
        competitor_id: &str,
    ) -> crate::error::Result<Vec<TournamentResult>> {
        let mut results: Vec<TournamentResult> = self
            .read()?
            .tournament_results
            .iter()
            .filter(|r| r.competitor_id == competitor_id)
            .cloned()
            .collect();

        results.sort_by(|a, b| b.held_at.cmp(&a.held_at));
        Ok(results)
    }

    fn results_for_tournament(
        &self,
        tournament: &str,
    ) -> crate::error::Result<Vec<TournamentResult>> {
        let mut results: Vec<TournamentResult> = self
            .read()?
            .tournament_results
            .iter()
            .filter(|r| r.tournament == tournament)
            .cloned()
            .collect();

        results.sort_by_key(|r| r.placement);
        Ok(results)
    }
}
