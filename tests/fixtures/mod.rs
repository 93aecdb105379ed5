//! Test fixtures shared by the integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use elo_ladder::config::AppConfig;
use elo_ladder::service::AppState;
use elo_ladder::store::{CategoryStore, CompetitorStore, InMemoryStore, MatchStore};
use elo_ladder::types::{Category, Competitor, MatchOutcome, NewCompetitor, NewMatch};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// First timestamp handed out by the fixtures
pub fn season_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 1, 10, 12, 0, 0).unwrap()
}

/// A bare outcome for feeding the engine directly
pub fn outcome(seq: i64, a: &str, b: &str, score_a: u32, score_b: u32) -> MatchOutcome {
    MatchOutcome {
        id: format!("m{}", seq),
        category: "melee".to_string(),
        competitor_a: a.to_string(),
        competitor_b: b.to_string(),
        score_a,
        score_b,
        played_at: season_start() + Duration::hours(seq),
        hidden: false,
        tournament: None,
    }
}

/// Store wrapper that registers players by nickname and plays matches in
/// chronological order
pub struct LadderFixture {
    pub store: Arc<InMemoryStore>,
    categories: HashMap<String, Category>,
    players: HashMap<String, Competitor>,
    clock: AtomicI64,
}

impl LadderFixture {
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()))
    }

    pub fn with_store(store: Arc<InMemoryStore>) -> Self {
        Self {
            store,
            categories: HashMap::new(),
            players: HashMap::new(),
            clock: AtomicI64::new(0),
        }
    }

    /// Add a category and remember it by name
    pub fn category(&mut self, name: &str) -> Category {
        let category = self.store.add_category(name).unwrap();
        self.categories.insert(name.to_string(), category.clone());
        category
    }

    /// Register the named players
    pub fn players(&mut self, nicknames: &[&str]) {
        for nickname in nicknames {
            let competitor = self
                .store
                .add_competitor(NewCompetitor {
                    nickname: nickname.to_string(),
                    ..Default::default()
                })
                .unwrap();
            self.players.insert(nickname.to_string(), competitor);
        }
    }

    /// Registered competitor by nickname
    pub fn player(&self, nickname: &str) -> &Competitor {
        &self.players[nickname]
    }

    /// ID of a registered competitor
    pub fn id(&self, nickname: &str) -> String {
        self.player(nickname).id.clone()
    }

    /// Record a match one hour after the previous one
    pub fn play(&self, category: &str, a: &str, b: &str, score_a: u32, score_b: u32) -> MatchOutcome {
        let hour = self.clock.fetch_add(1, Ordering::SeqCst);
        self.store
            .add_match(NewMatch {
                category: self.categories[category].id.clone(),
                competitor_a: self.id(a),
                competitor_b: self.id(b),
                score_a,
                score_b,
                played_at: Some(season_start() + Duration::hours(hour)),
                tournament: None,
            })
            .unwrap()
    }
}

/// A running application around a seeded Melee ladder
///
/// Mango beats Armada 3-1, Armada beats Hungrybox 3-0, Hungrybox and Mango
/// draw nothing (0-0, skipped), then Leffen beats Mango 2-1.
pub async fn seeded_state() -> (Arc<AppState>, LadderFixture) {
    let store = Arc::new(InMemoryStore::new());
    let mut ladder = LadderFixture::with_store(store.clone());
    ladder.category("Melee");
    ladder.category("Smash 4");
    ladder.players(&["Mango", "Armada", "Hungrybox", "Leffen", "ZeRo"]);

    ladder.play("Melee", "Mango", "Armada", 3, 1);
    ladder.play("Melee", "Armada", "Hungrybox", 3, 0);
    ladder.play("Melee", "Hungrybox", "Mango", 0, 0);
    ladder.play("Melee", "Leffen", "Mango", 2, 1);
    ladder.play("Smash 4", "ZeRo", "Mango", 3, 0);

    let state = Arc::new(AppState::with_store(AppConfig::default(), store).unwrap());
    state.start().await.unwrap();

    (state, ladder)
}
