//! Integration tests for the elo-ladder service
//!
//! These tests run the store, the ranking service and the application state
//! together:
//! - Rankings over a seeded ladder
//! - Category isolation and recomputation after edits
//! - Competitor merges
//! - Snapshot persistence across restarts
//! - Concurrent ranking requests

mod fixtures;

use elo_ladder::config::AppConfig;
use elo_ladder::service::AppState;
use elo_ladder::store::{CompetitorStore, MatchStore};
use elo_ladder::types::{MatchUpdate, SkipReason};
use elo_ladder::LadderError;
use std::time::Duration;

use fixtures::seeded_state;

#[tokio::test]
async fn test_seeded_melee_ranking() {
    let (state, _ladder) = seeded_state().await;

    let ranking = state.rankings().rankings_by_path("melee").unwrap();

    let order: Vec<_> = ranking
        .entries
        .iter()
        .map(|e| (e.display_name.as_str(), e.rating))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Armada", 1008),
            ("Leffen", 1006),
            ("Mango", 1002),
            ("Hungrybox", 984)
        ]
    );

    // The 0-0 record is reported and does not count for anyone
    assert_eq!(ranking.skipped.len(), 1);
    assert_eq!(ranking.skipped[0].reason, SkipReason::DegenerateMatch);
    let hungrybox = &ranking.entries[3];
    assert_eq!(hungrybox.matches_played, 1);

    let positions: Vec<_> = ranking.entries.iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_categories_never_mix() {
    let (state, _ladder) = seeded_state().await;

    let smash4 = state.rankings().rankings_by_path("smash4").unwrap();
    let names: Vec<_> = smash4
        .entries
        .iter()
        .map(|e| e.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["ZeRo", "Mango"]);
    assert_eq!(smash4.entries[0].rating, 1016);

    let melee = state.rankings().rankings_by_path("melee").unwrap();
    assert!(melee.entries.iter().all(|e| e.display_name != "ZeRo"));
}

#[tokio::test]
async fn test_rankings_follow_new_results() {
    let (state, ladder) = seeded_state().await;
    let before = state.rankings().rankings_by_path("melee").unwrap();

    ladder.play("Melee", "Hungrybox", "Armada", 3, 0);
    ladder.play("Melee", "Hungrybox", "Leffen", 3, 0);

    let after = state.rankings().rankings_by_path("melee").unwrap();
    assert_ne!(before.entries, after.entries);

    let hungrybox = after
        .entries
        .iter()
        .find(|e| e.display_name == "Hungrybox")
        .unwrap();
    assert_eq!(hungrybox.match_wins, 2);
    assert!(hungrybox.rating > 1000);
}

#[tokio::test]
async fn test_fixing_a_score_replays_history() {
    let (state, ladder) = seeded_state().await;

    // Correct the 0-0 record to a real result
    let skipped = state.rankings().rankings_by_path("melee").unwrap().skipped[0]
        .outcome_id
        .clone();
    state
        .store()
        .update_match(
            &skipped,
            MatchUpdate {
                score_a: Some(2),
                score_b: Some(0),
                ..Default::default()
            },
        )
        .unwrap();

    let ranking = state.rankings().rankings_by_path("melee").unwrap();
    assert!(ranking.skipped.is_empty());

    let hungrybox = ranking
        .entries
        .iter()
        .find(|e| e.competitor_id == ladder.id("Hungrybox"))
        .unwrap();
    assert_eq!(hungrybox.matches_played, 2);
}

#[tokio::test]
async fn test_hiding_a_match_replays_history() {
    let (state, ladder) = seeded_state().await;
    let extra = ladder.play("Melee", "Hungrybox", "Leffen", 3, 0);
    let with_extra = state.rankings().rankings_by_path("melee").unwrap();

    state
        .store()
        .update_match(
            &extra.id,
            MatchUpdate {
                hidden: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

    let without = state.rankings().rankings_by_path("melee").unwrap();
    assert_ne!(with_extra.entries, without.entries);
    assert_eq!(without.entries[0].display_name, "Armada");
    assert_eq!(without.entries[0].rating, 1008);
}

#[tokio::test]
async fn test_merge_folds_history_into_one_competitor() {
    let (state, ladder) = seeded_state().await;

    let reassigned = state
        .store()
        .merge_competitors(&ladder.id("Armada"), &ladder.id("Leffen"))
        .unwrap();
    assert_eq!(reassigned, 1);

    let ranking = state.rankings().rankings_by_path("melee").unwrap();
    assert_eq!(ranking.entries.len(), 3);

    let armada = ranking
        .entries
        .iter()
        .find(|e| e.display_name == "Armada")
        .unwrap();
    assert_eq!(armada.matches_played, 3);
    assert_eq!(armada.match_wins, 2);

    let merged = state
        .store()
        .get_competitor(&ladder.id("Armada"))
        .unwrap()
        .unwrap();
    assert_eq!(merged.aliases, vec!["Leffen".to_string()]);
}

#[tokio::test]
async fn test_profile_and_faceoff() {
    let (state, ladder) = seeded_state().await;
    let service = state.rankings();

    let profile = service
        .competitor_profile(&ladder.id("Mango"), false)
        .unwrap();
    let names: Vec<_> = profile
        .categories
        .iter()
        .map(|c| c.category_name.as_str())
        .collect();
    assert_eq!(names, vec!["Smash 4", "Melee"]);
    assert_eq!(profile.categories[1].rating, Some(1002));
    assert_eq!(profile.categories[1].position, Some(3));

    let melee = service.resolve_category_path("melee").unwrap();
    let faceoff = service
        .faceoff(&ladder.id("Mango"), &ladder.id("Armada"), Some(&melee.id))
        .unwrap();
    assert_eq!(faceoff.matches.len(), 1);
    assert_eq!((faceoff.match_wins_a, faceoff.match_wins_b), (1, 0));
    assert_eq!((faceoff.game_wins_a, faceoff.game_wins_b), (3, 1));
    assert_eq!(faceoff.rating_a, Some(1002));
    assert_eq!(faceoff.rating_b, Some(1008));
    assert!(faceoff.expected_score_a.unwrap() < 0.5);
}

#[tokio::test]
async fn test_snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ladder.json");

    let (state, _ladder) = seeded_state().await;
    let before = state.rankings().rankings_by_path("melee").unwrap();
    state.store().snapshot().unwrap().save(&path).unwrap();
    state.shutdown().await.unwrap();

    let mut config = AppConfig::default();
    config.storage.data_file = Some(path);
    let restarted = AppState::new(config).await.unwrap();

    let after = restarted.rankings().rankings_by_path("melee").unwrap();
    assert_eq!(before.entries, after.entries);
    assert_eq!(before.skipped, after.skipped);
}

#[tokio::test]
async fn test_concurrent_ranking_requests_agree() {
    let (state, _ladder) = seeded_state().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = state.rankings();
        handles.push(tokio::spawn(async move {
            service
                .within_deadline("melee", Duration::from_secs(5), |s| {
                    s.rankings_by_path("melee")
                })
                .await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap().entries);
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_unknown_category_is_not_found() {
    let (state, _ladder) = seeded_state().await;

    let err = state.rankings().rankings_by_path("brawl").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LadderError>(),
        Some(LadderError::CategoryNotFound { .. })
    ));
}

#[tokio::test]
async fn test_ranking_metrics_recorded() {
    let (state, _ladder) = seeded_state().await;
    state.rankings().rankings_by_path("melee").unwrap();

    let text = state.metrics().encode_text().unwrap();
    assert!(text.contains("elo_ladder_ranking_computations_total{category=\"melee\"} 1"));
    assert!(text.contains("elo_ladder_skipped_outcomes_total{reason=\"degenerate_match\"} 1"));
    assert!(text.contains("elo_ladder_ranked_competitors{category=\"melee\"} 4"));
}
