//! Sorting and filtering of a ranking list for display
//!
//! Stateless: `arrange` is a pure function of its inputs and is re-run
//! whenever the list, the sort key or the filter changes.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{MediaCategory, Ranking};
use crate::time::millis_or_epoch;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    RankDesc,
    RankAsc,
    DateDesc,
    DateAsc,
    #[serde(alias = "title")]
    TitleAsc,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "rank-desc" => Ok(SortKey::RankDesc),
            "rank-asc" => Ok(SortKey::RankAsc),
            "date-desc" => Ok(SortKey::DateDesc),
            "date-asc" => Ok(SortKey::DateAsc),
            "title-asc" | "title" => Ok(SortKey::TitleAsc),
            other => Err(Error::Validation(format!("Unknown sort key: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(MediaCategory),
}

impl CategoryFilter {
    pub fn matches(&self, ranking: &Ranking) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => ranking.category() == *category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(c) => write!(f, "{}", c),
        }
    }
}

/// Base letters only: decomposed, combining marks dropped, lowercased
fn primary_key(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Dictionary title order
///
/// Compares base letters first ("Éclair" sorts with "e"), then accents,
/// then case.
fn compare_titles(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| {
            let a: String = a.nfd().collect::<String>().to_lowercase();
            let b: String = b.nfd().collect::<String>().to_lowercase();
            a.cmp(&b)
        })
        .then_with(|| a.cmp(b))
}

fn compare(key: SortKey, a: &Ranking, b: &Ranking) -> Ordering {
    match key {
        SortKey::RankDesc => b.rank.cmp(&a.rank),
        SortKey::RankAsc => a.rank.cmp(&b.rank),
        SortKey::DateDesc => {
            millis_or_epoch(b.created_at.as_ref()).cmp(&millis_or_epoch(a.created_at.as_ref()))
        }
        SortKey::DateAsc => {
            millis_or_epoch(a.created_at.as_ref()).cmp(&millis_or_epoch(b.created_at.as_ref()))
        }
        SortKey::TitleAsc => compare_titles(&a.media.title, &b.media.title),
    }
}

/// Filter then stable-sort the rankings for display
pub fn arrange(rankings: &[Ranking], sort: SortKey, filter: CategoryFilter) -> Vec<Ranking> {
    let mut out: Vec<Ranking> = rankings
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    out.sort_by(|a, b| compare(sort, a, b));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaItem, Rank};
    use chrono::{TimeZone, Utc};

    fn ranking(id: &str, rank: i64, category: MediaCategory, title: &str, created: Option<i64>) -> Ranking {
        Ranking {
            id: id.to_string(),
            user_id: "u".to_string(),
            media_id: id.to_string(),
            media: MediaItem::new(id, category, title),
            rank: Rank::new(rank).unwrap(),
            notes: None,
            created_at: created.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            updated_at: None,
        }
    }

    fn scenario() -> Vec<Ranking> {
        vec![
            ranking("a", 5, MediaCategory::Movie, "heat", Some(100)),
            ranking("b", 3, MediaCategory::Book, "Dune", Some(200)),
            ranking("c", 5, MediaCategory::Tv, "Andor", Some(300)),
        ]
    }

    fn ids(list: &[Ranking]) -> Vec<&str> {
        list.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_filter_book() {
        let out = arrange(&scenario(), SortKey::RankDesc, CategoryFilter::Only(MediaCategory::Book));
        assert_eq!(ids(&out), vec!["b"]);
    }

    #[test]
    fn test_filter_all_passes_through() {
        let out = arrange(&scenario(), SortKey::DateAsc, CategoryFilter::All);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_rank_desc_is_stable() {
        let out = arrange(&scenario(), SortKey::RankDesc, CategoryFilter::All);
        let ranks: Vec<u8> = out.iter().map(|r| r.rank.value()).collect();
        assert_eq!(ranks, vec![5, 5, 3]);
        assert_eq!(ids(&out), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_rank_asc() {
        let out = arrange(&scenario(), SortKey::RankAsc, CategoryFilter::All);
        assert_eq!(ids(&out), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_date_desc_missing_sorts_last() {
        let mut list = scenario();
        list.push(ranking("d", 1, MediaCategory::Game, "Zork", None));
        let out = arrange(&list, SortKey::DateDesc, CategoryFilter::All);
        assert_eq!(ids(&out), vec!["c", "b", "a", "d"]);
        let out = arrange(&list, SortKey::DateAsc, CategoryFilter::All);
        assert_eq!(ids(&out), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn test_title_ignores_case() {
        let out = arrange(&scenario(), SortKey::TitleAsc, CategoryFilter::All);
        assert_eq!(ids(&out), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_title_sorts_accented_initials_with_base_letter() {
        let list = vec![
            ranking("z", 3, MediaCategory::Game, "Zelda", None),
            ranking("e", 3, MediaCategory::Book, "Éclair", None),
            ranking("a", 3, MediaCategory::Movie, "apple", None),
            ranking("o", 3, MediaCategory::Book, "Ödipus", None),
        ];
        let out = arrange(&list, SortKey::TitleAsc, CategoryFilter::All);
        assert_eq!(ids(&out), vec!["a", "e", "o", "z"]);
    }

    #[test]
    fn test_title_unaccented_before_accented() {
        let list = vec![
            ranking("accent", 3, MediaCategory::Movie, "Résumé", None),
            ranking("plain", 3, MediaCategory::Movie, "Resume", None),
        ];
        let out = arrange(&list, SortKey::TitleAsc, CategoryFilter::All);
        assert_eq!(ids(&out), vec!["plain", "accent"]);
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!("title".parse::<SortKey>().unwrap(), SortKey::TitleAsc);
        assert_eq!("date-desc".parse::<SortKey>().unwrap(), SortKey::DateDesc);
        assert!("newest".parse::<SortKey>().is_err());
        assert_eq!("ALL".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "game".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(MediaCategory::Game)
        );
    }

    #[test]
    fn test_arrange_does_not_mutate_input() {
        let list = scenario();
        let _ = arrange(&list, SortKey::RankAsc, CategoryFilter::All);
        assert_eq!(ids(&list), vec!["a", "b", "c"]);
    }
}
