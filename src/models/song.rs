//! Song library

use serde::{Deserialize, Serialize};

use super::blank_as_none;
use crate::store::Entity;

/// A labelled link attached to a planned song (video, chart, recording)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceLink {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
}

impl ReferenceLink {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }

    /// Links without a URL are form leftovers and are not shown
    pub fn is_blank(&self) -> bool {
        self.url.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Song {
    pub title: String,

    #[serde(default)]
    pub artist: String,

    #[serde(default)]
    pub key: String,

    /// BPM or a word like "slow"; kept as entered
    #[serde(default)]
    pub tempo: String,

    #[serde(default)]
    pub duration: String,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub youtube_url: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub sheet_music_url: Option<String>,

    #[serde(default)]
    pub chord_chart: String,

    #[serde(default)]
    pub lyrics: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl Song {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Case-insensitive match on title, artist or any tag
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.artist.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

impl Entity for Song {
    const COLLECTION: &'static str = "songs";

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("song title must not be blank".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_covers_title_artist_tags() {
        let song = Song::new("Way Maker", "Sinach").with_tag("선포");
        assert!(song.matches_query("way"));
        assert!(song.matches_query("SINACH"));
        assert!(song.matches_query("선포"));
        assert!(!song.matches_query("hillsong"));
    }

    #[test]
    fn test_blank_urls_read_as_absent() {
        let song: Song = serde_json::from_value(serde_json::json!({
            "title": "Goodness of God",
            "youtube_url": "",
            "tags": []
        }))
        .unwrap();
        assert!(song.youtube_url.is_none());
        assert!(song.tempo.is_empty());
    }
}
