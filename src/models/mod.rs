//! Typed entities for the worship-team records
//!
//! Every record that crosses the document-store boundary has a struct here.
//! The store hands back untyped JSON maps; [`crate::store::Collection`]
//! decodes them into these types and runs [`crate::store::Entity::validate`]
//! on the way in and out.

pub mod archive;
pub mod attendance;
pub mod board;
pub mod calendar;
pub mod meeting;
pub mod member;
pub mod roster;
pub mod setlist;
pub mod song;
pub mod year_month;

pub use archive::ServiceRecord;

pub use attendance::{AttendanceRecord, AvailabilityStatus, EventType};
pub use board::{
    Announcement, AnnouncementCategory, PrayerCategory, PrayerComment, PrayerRequest,
    ReactionKind, Reactions,
};
pub use calendar::{CalendarEvent, EventCategory};
pub use meeting::{
    Meeting, OptionTally, QuestionKind, Survey, SurveyAnswer, SurveyKind, SurveyQuestion,
    SurveyResponse,
};
pub use member::{
    ExecutiveRole, Member, Position, PositionGroup, UnknownPosition, EXECUTIVE_ROLES,
    TEAM_LEADER_ROLE,
};
pub use roster::{Assignment, Assignments, RosterRecord, RosterStatus};
pub use setlist::{SetlistSong, WeeklySetlist};
pub use song::{ReferenceLink, Song};
pub use year_month::{ParseYearMonthError, YearMonth};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Treat `""` and whitespace-only strings as absent
pub(crate) fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// Optional `YYYY-MM-DD` date where a blank string means absent
pub(crate) fn blank_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_as_none(deserializer)? {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
