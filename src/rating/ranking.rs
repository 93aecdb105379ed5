//! Turning a rating table into a display ranking

use crate::types::{CompetitorId, RankedEntry, RatingRecord};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Sort rated competitors into a display ranking
///
/// Order is descending by rating, then ascending by display name (byte-wise,
/// case-sensitive), then by competitor ID. `lookup` resolves display names;
/// a competitor it cannot resolve keeps its place with an empty name.
pub fn rank<F>(ratings: &HashMap<CompetitorId, RatingRecord>, lookup: F) -> Vec<RankedEntry>
where
    F: Fn(&CompetitorId) -> Option<String>,
{
    let mut named: Vec<(String, &RatingRecord)> = ratings
        .values()
        .map(|record| (lookup(&record.competitor_id).unwrap_or_default(), record))
        .collect();

    named.sort_by(|(name_a, a), (name_b, b)| compare(a, name_a, b, name_b));

    named
        .into_iter()
        .enumerate()
        .map(|(idx, (display_name, record))| RankedEntry {
            position: idx + 1,
            competitor_id: record.competitor_id.clone(),
            display_name,
            rating: record.rating,
            matches_played: record.matches_played,
            match_wins: record.match_wins,
            match_losses: record.match_losses,
            games_won: record.games_won,
            games_lost: record.games_lost,
        })
        .collect()
}

fn compare(a: &RatingRecord, name_a: &str, b: &RatingRecord, name_b: &str) -> Ordering {
    b.rating
        .cmp(&a.rating)
        .then_with(|| name_a.cmp(name_b))
        .then_with(|| a.competitor_id.cmp(&b.competitor_id))
}
