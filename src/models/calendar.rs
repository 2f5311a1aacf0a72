//! Church and team calendar events

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::blank_as_none;
use crate::store::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventCategory {
    #[serde(rename = "예배")]
    #[default]
    Worship,
    #[serde(rename = "연습")]
    Practice,
    #[serde(rename = "팀행사")]
    TeamEvent,
    #[serde(rename = "특별일정")]
    Special,
    #[serde(rename = "휴무")]
    DayOff,
}

impl EventCategory {
    pub fn korean_label(&self) -> &'static str {
        match self {
            Self::Worship => "예배",
            Self::Practice => "연습",
            Self::TeamEvent => "팀행사",
            Self::Special => "특별일정",
            Self::DayOff => "휴무",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.korean_label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,

    pub date: NaiveDate,

    /// `HH:MM`, as entered
    #[serde(default, deserialize_with = "blank_as_none")]
    pub time: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub location: Option<String>,

    #[serde(default)]
    pub category: EventCategory,

    #[serde(default)]
    pub description: String,
}

impl CalendarEvent {
    pub fn new(title: impl Into<String>, date: NaiveDate, category: EventCategory) -> Self {
        Self {
            title: title.into(),
            date,
            time: None,
            location: None,
            category,
            description: String::new(),
        }
    }
}

impl Entity for CalendarEvent {
    const COLLECTION: &'static str = "events";

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("event title must not be blank".to_string());
        }
        Ok(())
    }
}
