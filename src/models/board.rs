//! Announcements and prayer requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::store::Entity;

// ============================================================================
// Announcements
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AnnouncementCategory {
    #[serde(rename = "일정")]
    Schedule,
    #[serde(rename = "중요")]
    Important,
    #[serde(rename = "찬양")]
    Worship,
    #[serde(rename = "팀행사")]
    TeamEvent,
    #[serde(rename = "기타")]
    #[default]
    Other,
}

impl AnnouncementCategory {
    pub fn korean_label(&self) -> &'static str {
        match self {
            Self::Schedule => "일정",
            Self::Important => "중요",
            Self::Worship => "찬양",
            Self::TeamEvent => "팀행사",
            Self::Other => "기타",
        }
    }
}

impl fmt::Display for AnnouncementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.korean_label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub category: AnnouncementCategory,

    #[serde(default)]
    pub is_pinned: bool,

    #[serde(default)]
    pub author_name: String,

    /// Emails of members who opened it
    #[serde(default)]
    pub read_by: Vec<String>,
}

impl Announcement {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: AnnouncementCategory::default(),
            is_pinned: false,
            author_name: String::new(),
            read_by: Vec::new(),
        }
    }

    /// Case-insensitive match on title or content
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.content.to_lowercase().contains(&query)
    }
}

impl Entity for Announcement {
    const COLLECTION: &'static str = "announcements";

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("announcement title must not be blank".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Prayer requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PrayerCategory {
    #[serde(rename = "개인")]
    #[default]
    Personal,
    #[serde(rename = "팀")]
    Team,
    #[serde(rename = "가족")]
    Family,
    #[serde(rename = "교회")]
    Church,
    #[serde(rename = "기타")]
    Other,
}

/// Reaction buttons on a prayer request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Pray,
    Heart,
    Strength,
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pray" => Ok(Self::Pray),
            "heart" => Ok(Self::Heart),
            "strength" => Ok(Self::Strength),
            other => Err(format!("unknown reaction '{other}'")),
        }
    }
}

/// Emails per reaction kind
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reactions {
    #[serde(default)]
    pub pray: Vec<String>,
    #[serde(default)]
    pub heart: Vec<String>,
    #[serde(default)]
    pub strength: Vec<String>,
}

impl Reactions {
    pub fn get_mut(&mut self, kind: ReactionKind) -> &mut Vec<String> {
        match kind {
            ReactionKind::Pray => &mut self.pray,
            ReactionKind::Heart => &mut self.heart,
            ReactionKind::Strength => &mut self.strength,
        }
    }

    pub fn get(&self, kind: ReactionKind) -> &[String] {
        match kind {
            ReactionKind::Pray => &self.pray,
            ReactionKind::Heart => &self.heart,
            ReactionKind::Strength => &self.strength,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerComment {
    pub id: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerRequest {
    pub content: String,

    #[serde(default)]
    pub category: PrayerCategory,

    #[serde(default)]
    pub is_urgent: bool,

    #[serde(default)]
    pub author_name: String,

    /// Email of the member who posted it
    #[serde(default)]
    pub created_by: Option<String>,

    /// Emails of members praying for this request
    #[serde(default)]
    pub prayers: Vec<String>,

    #[serde(default)]
    pub reactions: Reactions,

    #[serde(default)]
    pub comments: Vec<PrayerComment>,

    #[serde(default)]
    pub is_answered: bool,

    #[serde(default)]
    pub answer_testimony: Option<String>,
}

impl PrayerRequest {
    pub fn new(content: impl Into<String>, category: PrayerCategory) -> Self {
        Self {
            content: content.into(),
            category,
            is_urgent: false,
            author_name: String::new(),
            created_by: None,
            prayers: Vec::new(),
            reactions: Reactions::default(),
            comments: Vec::new(),
            is_answered: false,
            answer_testimony: None,
        }
    }
}

impl Entity for PrayerRequest {
    const COLLECTION: &'static str = "prayer_requests";

    fn validate(&self) -> Result<(), String> {
        if self.content.trim().is_empty() {
            return Err("prayer request must have content".to_string());
        }
        Ok(())
    }
}

/// Add `email` if absent, remove it if present. Returns whether it is now present.
pub fn toggle_email(list: &mut Vec<String>, email: &str) -> bool {
    if let Some(pos) = list.iter().position(|e| e == email) {
        list.remove(pos);
        false
    } else {
        list.push(email.to_string());
        true
    }
}
