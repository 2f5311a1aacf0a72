//! Attendance (availability) records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::YearMonth;
use crate::store::Entity;

/// Kind of gathering a record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Sunday service
    #[default]
    SundayWorship,
    /// Saturday rehearsal
    SaturdayPractice,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SundayWorship => "sunday_worship",
            Self::SaturdayPractice => "saturday_practice",
        }
    }

    pub fn korean_label(&self) -> &'static str {
        match self {
            Self::SundayWorship => "주일",
            Self::SaturdayPractice => "연습",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sunday_worship" => Ok(Self::SundayWorship),
            "saturday_practice" => Ok(Self::SaturdayPractice),
            other => Err(format!("unknown event type '{other}'")),
        }
    }
}

/// A member's self-reported capacity to serve
///
/// `Pending` is the state of a member who has never answered; it is what
/// the ledger reports when no record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
    #[default]
    Pending,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Pending => "pending",
        }
    }

    pub fn korean_label(&self) -> &'static str {
        match self {
            Self::Available => "가능",
            Self::Unavailable => "불가",
            Self::Pending => "미정",
        }
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvailabilityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "unavailable" => Ok(Self::Unavailable),
            "pending" => Ok(Self::Pending),
            other => Err(format!("unknown availability status '{other}'")),
        }
    }
}

/// One member's answer for one date and event type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub member_id: String,

    /// Name at the time of answering
    pub member_name: String,

    pub date: NaiveDate,

    #[serde(default)]
    pub event_type: EventType,

    pub status: AvailabilityStatus,

    /// Month bucket for bulk retrieval
    pub year_month: YearMonth,
}

impl AttendanceRecord {
    pub fn new(
        member_id: impl Into<String>,
        member_name: impl Into<String>,
        date: NaiveDate,
        event_type: EventType,
        status: AvailabilityStatus,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            member_name: member_name.into(),
            date,
            event_type,
            status,
            year_month: YearMonth::from_date(date),
        }
    }

    /// Whether this record is the one for (member, date, event type)
    pub fn matches(&self, member_id: &str, date: NaiveDate, event_type: EventType) -> bool {
        self.member_id == member_id && self.date == date && self.event_type == event_type
    }
}

impl Entity for AttendanceRecord {
    const COLLECTION: &'static str = "attendance";

    fn validate(&self) -> Result<(), String> {
        if self.member_id.is_empty() {
            return Err("attendance record without member_id".to_string());
        }
        if !self.year_month.contains(self.date) {
            return Err(format!(
                "year_month {} does not contain date {}",
                self.year_month, self.date
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stamps_year_month() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let record = AttendanceRecord::new(
            "m1",
            "Kim",
            date,
            EventType::SundayWorship,
            AvailabilityStatus::Available,
        );
        assert_eq!(record.year_month.to_string(), "2024-06");
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_wire_format() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let record = AttendanceRecord::new(
            "m1",
            "Kim",
            date,
            EventType::SundayWorship,
            AvailabilityStatus::Unavailable,
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["date"], "2024-06-02");
        assert_eq!(value["event_type"], "sunday_worship");
        assert_eq!(value["status"], "unavailable");
        assert_eq!(value["year_month"], "2024-06");
    }

    #[test]
    fn test_mismatched_bucket_is_invalid() {
        let mut record = AttendanceRecord::new(
            "m1",
            "Kim",
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            EventType::SundayWorship,
            AvailabilityStatus::Available,
        );
        record.year_month = YearMonth::new(2024, 7).unwrap();
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_pending_is_default() {
        assert_eq!(AvailabilityStatus::default(), AvailabilityStatus::Pending);
        assert_eq!("pending".parse::<AvailabilityStatus>().unwrap(), AvailabilityStatus::Pending);
    }
}
