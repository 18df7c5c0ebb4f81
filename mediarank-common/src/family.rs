//! Family membership model
//!
//! A family groups user ids under a shared name. Membership is kept twice: as
//! the ordered `member_ids` list on the family and as one role record per
//! (family, user). Both are written together by `db::families`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Role a member holds in a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyRole {
    Parent,
    Guardian,
    Child,
    Grandmother,
    Grandfather,
    Aunt,
    Uncle,
    Cousin,
    Sibling,
    Other,
}

impl FamilyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FamilyRole::Parent => "parent",
            FamilyRole::Guardian => "guardian",
            FamilyRole::Child => "child",
            FamilyRole::Grandmother => "grandmother",
            FamilyRole::Grandfather => "grandfather",
            FamilyRole::Aunt => "aunt",
            FamilyRole::Uncle => "uncle",
            FamilyRole::Cousin => "cousin",
            FamilyRole::Sibling => "sibling",
            FamilyRole::Other => "other",
        }
    }
}

impl fmt::Display for FamilyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FamilyRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "parent" => Ok(FamilyRole::Parent),
            "guardian" => Ok(FamilyRole::Guardian),
            "child" => Ok(FamilyRole::Child),
            "grandmother" => Ok(FamilyRole::Grandmother),
            "grandfather" => Ok(FamilyRole::Grandfather),
            "aunt" => Ok(FamilyRole::Aunt),
            "uncle" => Ok(FamilyRole::Uncle),
            "cousin" => Ok(FamilyRole::Cousin),
            "sibling" => Ok(FamilyRole::Sibling),
            "other" => Ok(FamilyRole::Other),
            other => Err(Error::Validation(format!("Unknown family role: {}", other))),
        }
    }
}

/// Who can see a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrivacyLevel {
    #[default]
    Private,
    FamilyOnly,
    Public,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilySettings {
    pub allow_child_rankings: bool,
    pub require_parent_approval: bool,
    pub privacy_level: PrivacyLevel,
}

impl Default for FamilySettings {
    fn default() -> Self {
        Self {
            allow_child_rankings: true,
            require_parent_approval: false,
            privacy_level: PrivacyLevel::Private,
        }
    }
}

/// Partial settings update, merged over the stored settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilySettingsUpdate {
    pub allow_child_rankings: Option<bool>,
    pub require_parent_approval: Option<bool>,
    pub privacy_level: Option<PrivacyLevel>,
}

impl FamilySettings {
    pub fn merge(&mut self, update: FamilySettingsUpdate) {
        if let Some(v) = update.allow_child_rankings {
            self.allow_child_rankings = v;
        }
        if let Some(v) = update.require_parent_approval {
            self.require_parent_approval = v;
        }
        if let Some(v) = update.privacy_level {
            self.privacy_level = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// User id of the creator; only the creator may delete the family
    pub created_by: String,
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub settings: FamilySettings,
}

impl Family {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == user_id)
    }
}

/// Role record for one member of one family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMemberRole {
    pub user_id: String,
    pub family_id: String,
    pub role: FamilyRole,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = FamilySettings::default();
        assert!(s.allow_child_rankings);
        assert!(!s.require_parent_approval);
        assert_eq!(s.privacy_level, PrivacyLevel::Private);
    }

    #[test]
    fn test_settings_merge_keeps_unspecified() {
        let mut s = FamilySettings::default();
        s.merge(FamilySettingsUpdate {
            privacy_level: Some(PrivacyLevel::FamilyOnly),
            ..Default::default()
        });
        assert_eq!(s.privacy_level, PrivacyLevel::FamilyOnly);
        assert!(s.allow_child_rankings);
    }

    #[test]
    fn test_privacy_level_wire_names() {
        assert_eq!(
            serde_json::to_string(&PrivacyLevel::FamilyOnly).unwrap(),
            "\"family-only\""
        );
    }

    #[test]
    fn test_role_parse_round_trip() {
        for role in [FamilyRole::Parent, FamilyRole::Grandmother, FamilyRole::Other] {
            assert_eq!(role.as_str().parse::<FamilyRole>().unwrap(), role);
        }
        assert!("boss".parse::<FamilyRole>().is_err());
    }
}
