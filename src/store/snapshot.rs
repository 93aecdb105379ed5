//! JSON snapshot of the whole store

use crate::error::LadderError;
use crate::types::{Category, Competitor, MatchOutcome, TournamentResult};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Everything the store holds, in a serializable form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub matches: Vec<MatchOutcome>,
    #[serde(default)]
    pub tournament_results: Vec<TournamentResult>,
}

impl Snapshot {
    /// Read a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LadderError::SnapshotError {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|e| LadderError::SnapshotError {
                message: format!("Failed to parse {}: {}", path.display(), e),
            })?;

        info!(
            "Loaded snapshot from {} - {} categories, {} competitors, {} matches",
            path.display(),
            snapshot.categories.len(),
            snapshot.competitors.len(),
            snapshot.matches.len()
        );

        Ok(snapshot)
    }

    /// Write the snapshot to a JSON file, replacing it
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| LadderError::SnapshotError {
                message: format!("Failed to serialize snapshot: {}", e),
            })?;

        std::fs::write(path, content).map_err(|e| LadderError::SnapshotError {
            message: format!("Failed to write {}: {}", path.display(), e),
        })?;

        info!(
            "Saved snapshot to {} - {} matches",
            path.display(),
            self.matches.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> Snapshot {
        Snapshot {
            categories: vec![Category {
                id: "c1".to_string(),
                name: "Melee".to_string(),
                url_path: "melee".to_string(),
            }],
            competitors: vec![Competitor {
                id: "p1".to_string(),
                nickname: "Mango".to_string(),
                url_path: "mango".to_string(),
                tag: None,
                aliases: vec![],
            }],
            matches: vec![MatchOutcome {
                id: "m1".to_string(),
                category: "c1".to_string(),
                competitor_a: "p1".to_string(),
                competitor_b: "p2".to_string(),
                score_a: 3,
                score_b: 1,
                played_at: Utc.with_ymd_and_hms(2015, 7, 19, 20, 0, 0).unwrap(),
                hidden: false,
                tournament: Some("EVO 2015".to_string()),
            }],
            tournament_results: vec![TournamentResult {
                id: "r1".to_string(),
                competitor_id: "p1".to_string(),
                category: "c1".to_string(),
                tournament: "EVO 2015".to_string(),
                held_at: Utc.with_ymd_and_hms(2015, 7, 17, 9, 0, 0).unwrap(),
                seed: 3,
                placement: 2,
            }],
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ladder.json");

        let snapshot = sample();
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let snapshot: Snapshot = serde_json::from_str(r#"{ "categories": [] }"#).unwrap();
        assert!(snapshot.competitors.is_empty());
        assert!(snapshot.matches.is_empty());
        assert!(snapshot.tournament_results.is_empty());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = Snapshot::load(&dir.path().join("missing.json"));
        assert!(missing.is_err());

        let garbled = dir.path().join("garbled.json");
        std::fs::write(&garbled, "{ not json").unwrap();
        let err = Snapshot::load(&garbled).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LadderError>(),
            Some(LadderError::SnapshotError { .. })
        ));
    }
}
