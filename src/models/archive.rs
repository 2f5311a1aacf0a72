//! Service-record archive: what was sung, who served, the recording

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{blank_as_none, YearMonth};
use crate::store::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub date: NaiveDate,

    pub title: String,

    #[serde(default)]
    pub worship_leader: String,

    /// Position label to member name
    #[serde(default)]
    pub team_members: BTreeMap<String, String>,

    /// Song titles in service order
    #[serde(default)]
    pub songs: Vec<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub audio_url: Option<String>,

    #[serde(default)]
    pub notes: String,
}

impl ServiceRecord {
    pub fn new(date: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            date,
            title: title.into(),
            worship_leader: String::new(),
            team_members: BTreeMap::new(),
            songs: Vec::new(),
            audio_url: None,
            notes: String::new(),
        }
    }

    /// Split a comma-separated song line, dropping empty entries
    pub fn with_song_line(mut self, line: &str) -> Self {
        self.songs = line
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    /// Case-insensitive match on title, leader or any song
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.worship_leader.to_lowercase().contains(&query)
            || self.songs.iter().any(|s| s.to_lowercase().contains(&query))
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

impl Entity for ServiceRecord {
    const COLLECTION: &'static str = "service_records";

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("service record title must not be blank".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_line_and_query() {
        let mut record = ServiceRecord::new(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(), "주일예배")
            .with_song_line("Way Maker, , 주님의 선하심 ");
        record.worship_leader = "Lee".to_string();

        assert_eq!(record.songs, vec!["Way Maker", "주님의 선하심"]);
        assert!(record.matches_query("way maker"));
        assert!(record.matches_query("lee"));
        assert!(record.matches_query("주일"));
        assert!(!record.matches_query("Park"));
        assert_eq!(record.year_month().to_string(), "2024-06");
    }
}
