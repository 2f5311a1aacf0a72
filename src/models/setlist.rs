//! Weekly set-lists

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ReferenceLink, RosterStatus, YearMonth};
use crate::store::Entity;

/// A song planned for a service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetlistSong {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub reference_links: Vec<ReferenceLink>,
    #[serde(default)]
    pub notes: String,
}

impl SetlistSong {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.reference_links.push(ReferenceLink::new(label, url));
        self
    }

    /// Links that actually point somewhere
    pub fn links(&self) -> impl Iterator<Item = &ReferenceLink> {
        self.reference_links.iter().filter(|l| !l.is_blank())
    }
}

/// Songs chosen for one service date
///
/// `year_month` and `week_number` are derived from `date` when the set-list
/// is written; see [`crate::team::setlists`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySetlist {
    pub date: NaiveDate,

    #[serde(default)]
    pub worship_leader: String,

    #[serde(default)]
    pub songs: Vec<SetlistSong>,

    #[serde(default)]
    pub practice_notes: String,

    #[serde(default)]
    pub status: RosterStatus,

    pub year_month: YearMonth,

    pub week_number: u32,
}

impl Entity for WeeklySetlist {
    const COLLECTION: &'static str = "weekly_setlists";

    fn validate(&self) -> Result<(), String> {
        if !self.year_month.contains(self.date) {
            return Err(format!(
                "year_month {} does not contain date {}",
                self.year_month, self.date
            ));
        }
        if self.week_number == 0 {
            return Err("week_number starts at 1".to_string());
        }
        Ok(())
    }
}
