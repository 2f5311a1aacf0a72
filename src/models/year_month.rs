//! Calendar month bucket ("YYYY-MM")
//!
//! Attendance records and set-lists carry a `year_month` field so that a
//! whole month can be fetched with a single equality filter.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar month, stored as the first day of that month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    /// Create from year and month (1-12)
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// The month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists for every representable month
        Self(date - chrono::Duration::days(i64::from(date.day0())))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// First calendar day of the month
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Last calendar day of the month
    pub fn last_day(&self) -> NaiveDate {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Every day of the month in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let month = self.month();
        self.0.iter_days().take_while(move |d| d.month() == month)
    }

    /// Check whether `date` falls inside this month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// Move by `delta` months (negative goes back). Saturates at the calendar bounds.
    pub fn offset(&self, delta: i32) -> Self {
        let shifted = if delta >= 0 {
            self.0.checked_add_months(Months::new(delta.unsigned_abs()))
        } else {
            self.0.checked_sub_months(Months::new(delta.unsigned_abs()))
        };
        shifted.map(Self).unwrap_or(*self)
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    pub fn previous(&self) -> Self {
        self.offset(-1)
    }

    /// Korean display label, e.g. "2024년 6월"
    pub fn korean_label(&self) -> String {
        format!("{}년 {}월", self.year(), self.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// Error returned when a "YYYY-MM" string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid year-month '{0}', expected YYYY-MM")]
pub struct ParseYearMonthError(pub String);

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseYearMonthError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(err());
        }
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let ym: YearMonth = "2024-06".parse().unwrap();
        assert_eq!(ym.year(), 2024);
        assert_eq!(ym.month(), 6);
        assert_eq!(ym.to_string(), "2024-06");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("2024-6".parse::<YearMonth>().is_err());
        assert!("June".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_from_date_and_bounds() {
        let ym = YearMonth::from_date(date(2024, 2, 17));
        assert_eq!(ym.first_day(), date(2024, 2, 1));
        assert_eq!(ym.last_day(), date(2024, 2, 29));
        assert_eq!(ym.days().count(), 29);
    }

    #[test]
    fn test_offset_crosses_years() {
        let ym = YearMonth::new(2024, 12).unwrap();
        assert_eq!(ym.next().to_string(), "2025-01");
        assert_eq!(YearMonth::new(2024, 1).unwrap().previous().to_string(), "2023-12");
        assert_eq!(ym.offset(-11).to_string(), "2024-01");
    }

    #[test]
    fn test_contains() {
        let ym = YearMonth::new(2024, 6).unwrap();
        assert!(ym.contains(date(2024, 6, 30)));
        assert!(!ym.contains(date(2024, 7, 1)));
        assert!(!ym.contains(date(2023, 6, 1)));
    }

    #[test]
    fn test_serde_as_string() {
        let ym = YearMonth::new(2024, 6).unwrap();
        assert_eq!(serde_json::to_string(&ym).unwrap(), "\"2024-06\"");
        let back: YearMonth = serde_json::from_str("\"2024-06\"").unwrap();
        assert_eq!(back, ym);
    }
}
