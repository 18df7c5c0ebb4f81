//! Core data model: media snapshots, ranks, rankings, user profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::family::FamilyRole;
use crate::{Error, Result};

/// Identifier of a signed-in user, as asserted by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a user id; blank ids are treated as "not signed in"
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(Error::unauthenticated());
        }
        Ok(UserId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reject operations that arrive without a signed-in user
pub fn require_user(user: Option<&UserId>) -> Result<&UserId> {
    user.ok_or_else(Error::unauthenticated)
}

/// Kind of externally sourced content
///
/// `Music` exists in the model but has no search provider and no statistics
/// counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Movie,
    Tv,
    Book,
    Game,
    Music,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 5] = [
        MediaCategory::Movie,
        MediaCategory::Tv,
        MediaCategory::Book,
        MediaCategory::Game,
        MediaCategory::Music,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Movie => "movie",
            MediaCategory::Tv => "tv",
            MediaCategory::Book => "book",
            MediaCategory::Game => "game",
            MediaCategory::Music => "music",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "movie" => Ok(MediaCategory::Movie),
            "tv" => Ok(MediaCategory::Tv),
            "book" => Ok(MediaCategory::Book),
            "game" => Ok(MediaCategory::Game),
            "music" => Ok(MediaCategory::Music),
            other => Err(Error::Validation(format!("Unknown media category: {}", other))),
        }
    }
}

/// Normalized representation of a movie, show, book, or game
///
/// Copied inline into every ranking that references it. The copy is never
/// refreshed from the provider, so a ranking keeps the title it was rated
/// under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Provider identifier (not unique across providers)
    pub id: String,
    #[serde(rename = "type")]
    pub category: MediaCategory,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Provider rating on a 0-10 scale, unrelated to the user's rank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, category: MediaCategory, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            title: title.into(),
            release_date: None,
            poster: None,
            overview: None,
            rating: None,
        }
    }
}

/// User star rating, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rank(u8);

impl Rank {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate a raw rank value
    pub fn new(value: i64) -> Result<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Rank(value as u8))
        } else {
            Err(Error::Validation(format!(
                "Rank must be an integer between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Histogram bucket for this rank (rank - 1)
    pub fn bucket(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<i64> for Rank {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Rank::new(value)
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> u8 {
        rank.0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's rating plus optional notes for one media item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub id: String,
    pub user_id: String,
    pub media_id: String,
    /// Snapshot of the media at rating time
    pub media: MediaItem,
    pub rank: Rank,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ranking {
    pub fn category(&self) -> MediaCategory {
        self.media.category
    }

    /// Last activity time: update, else creation
    pub fn last_activity(&self) -> Option<&DateTime<Utc>> {
        self.updated_at.as_ref().or(self.created_at.as_ref())
    }
}

/// Link from a profile to the family the user belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyLink {
    pub family_id: String,
    pub role: FamilyRole,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

/// User profile document keyed by user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub family: Option<FamilyLink>,
}

impl UserProfile {
    pub fn new(uid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: display_name.into(),
            bio: String::new(),
            photo_url: None,
            favorite_genres: Vec::new(),
            created_at: None,
            updated_at: None,
            family: None,
        }
    }
}

/// Partial profile update; absent fields keep their stored values
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub favorite_genres: Option<Vec<String>>,
}

impl ProfileUpdate {
    /// Merge this update into a profile
    pub fn apply_to(self, profile: &mut UserProfile) {
        if let Some(email) = self.email {
            profile.email = Some(email);
        }
        if let Some(name) = self.display_name {
            profile.display_name = name;
        }
        if let Some(bio) = self.bio {
            profile.bio = bio;
        }
        if let Some(photo) = self.photo_url {
            profile.photo_url = Some(photo);
        }
        if let Some(genres) = self.favorite_genres {
            profile.favorite_genres = genres;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_user_id_is_unauthenticated() {
        assert!(matches!(UserId::new("  "), Err(Error::Authentication(_))));
        assert_eq!(UserId::new(" u1 ").unwrap().as_str(), "u1");
        assert!(matches!(require_user(None), Err(Error::Authentication(_))));
    }

    #[test]
    fn test_rank_bounds() {
        assert!(Rank::new(0).is_err());
        assert!(Rank::new(6).is_err());
        assert!(Rank::new(-3).is_err());
        for r in 1..=5 {
            assert_eq!(Rank::new(r).unwrap().value() as i64, r);
        }
    }

    #[test]
    fn test_rank_bucket() {
        assert_eq!(Rank::new(1).unwrap().bucket(), 0);
        assert_eq!(Rank::new(5).unwrap().bucket(), 4);
    }

    #[test]
    fn test_rank_deserialize_validates() {
        let ok: Rank = serde_json::from_str("4").unwrap();
        assert_eq!(ok.value(), 4);
        assert!(serde_json::from_str::<Rank>("7").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "4");
    }

    #[test]
    fn test_media_category_parse() {
        assert_eq!("Movie".parse::<MediaCategory>().unwrap(), MediaCategory::Movie);
        assert_eq!(" tv ".parse::<MediaCategory>().unwrap(), MediaCategory::Tv);
        assert!(matches!("song".parse::<MediaCategory>(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_media_item_json_shape() {
        let mut item = MediaItem::new("603", MediaCategory::Movie, "The Matrix");
        item.release_date = Some("1999-03-30".to_string());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "movie");
        assert_eq!(json["releaseDate"], "1999-03-30");
        assert!(json.get("poster").is_none());
    }

    #[test]
    fn test_profile_update_merges_only_present_fields() {
        let mut profile = UserProfile::new("u1", "Ada");
        profile.bio = "old".to_string();
        ProfileUpdate {
            display_name: Some("Ada L.".to_string()),
            ..Default::default()
        }
        .apply_to(&mut profile);
        assert_eq!(profile.display_name, "Ada L.");
        assert_eq!(profile.bio, "old");
    }
}
