//! Per-user ranking statistics
//!
//! Recomputed from the full ranking list on every call. Lists are per user and
//! small, so there is no incremental maintenance.

use serde::Serialize;
use std::cmp::Ordering;

use crate::models::{MediaCategory, Ranking};
use crate::time::millis_or_epoch;

/// Number of rankings reported as recent activity
pub const RECENT_RANKINGS_LIMIT: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: usize,
    /// Sum of all ranks
    pub total_ratings: u64,
    pub movie_count: usize,
    pub tv_count: usize,
    pub book_count: usize,
    pub game_count: usize,
    /// Mean rank rounded to one decimal; 0 for no rankings
    pub avg_rating: f64,
    pub highest_rated: Option<Ranking>,
    pub lowest_rated: Option<Ranking>,
    /// Most recent activity first
    pub recent_rankings: Vec<Ranking>,
    /// Count per rank, index = rank - 1
    pub rating_distribution: [u32; 5],
    pub most_common_rating: Option<u8>,
}

/// Round to a fixed number of decimal places
pub fn round_to_decimal(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Compute the summary for a user's rankings
pub fn compute_user_stats(rankings: &[Ranking]) -> UserStats {
    let mut distribution = [0u32; 5];
    let mut total_ratings: u64 = 0;
    let (mut movie, mut tv, mut book, mut game) = (0, 0, 0, 0);

    for ranking in rankings {
        distribution[ranking.rank.bucket()] += 1;
        total_ratings += ranking.rank.value() as u64;
        match ranking.category() {
            MediaCategory::Movie => movie += 1,
            MediaCategory::Tv => tv += 1,
            MediaCategory::Book => book += 1,
            MediaCategory::Game => game += 1,
            MediaCategory::Music => {}
        }
    }

    let avg_rating = if rankings.is_empty() {
        0.0
    } else {
        round_to_decimal(total_ratings as f64 / rankings.len() as f64, 1)
    };

    UserStats {
        total: rankings.len(),
        total_ratings,
        movie_count: movie,
        tv_count: tv,
        book_count: book,
        game_count: game,
        avg_rating,
        highest_rated: pick_extreme(rankings, |a, b| a.rank.cmp(&b.rank)).cloned(),
        lowest_rated: pick_extreme(rankings, |a, b| b.rank.cmp(&a.rank)).cloned(),
        recent_rankings: recent(rankings, RECENT_RANKINGS_LIMIT),
        rating_distribution: distribution,
        most_common_rating: most_common(&distribution, rankings.is_empty()),
    }
}

/// First maximum bucket wins, so the lowest rank wins ties
fn most_common(distribution: &[u32; 5], empty: bool) -> Option<u8> {
    if empty {
        return None;
    }
    let mut best = 0;
    for (i, count) in distribution.iter().enumerate() {
        if *count > distribution[best] {
            best = i;
        }
    }
    Some(best as u8 + 1)
}

/// Greatest element under `better`; ties go to the earliest created, then to
/// the earlier position in the list
fn pick_extreme<F>(rankings: &[Ranking], better: F) -> Option<&Ranking>
where
    F: Fn(&Ranking, &Ranking) -> Ordering,
{
    let mut best: Option<&Ranking> = None;
    for candidate in rankings {
        best = match best {
            None => Some(candidate),
            Some(current) => match better(candidate, current) {
                Ordering::Greater => Some(candidate),
                Ordering::Less => Some(current),
                Ordering::Equal => {
                    let c = millis_or_epoch(candidate.created_at.as_ref());
                    let b = millis_or_epoch(current.created_at.as_ref());
                    if c < b {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            },
        };
    }
    best
}

fn recent(rankings: &[Ranking], limit: usize) -> Vec<Ranking> {
    let mut sorted: Vec<&Ranking> = rankings.iter().collect();
    sorted.sort_by(|a, b| millis_or_epoch(b.last_activity()).cmp(&millis_or_epoch(a.last_activity())));
    sorted.into_iter().take(limit).cloned().collect()
}
