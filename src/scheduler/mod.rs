//! Weekly attendance and assignment scheduler
//!
//! Members answer whether they can serve on each Sunday (and Saturday
//! practice); leaders then assign available members to service positions
//! and publish the roster.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Scheduler (facade)                        │
//! │   open_month / switch_month / month_view / generation token   │
//! │  ┌──────────────────────┐        ┌─────────────────────────┐  │
//! │  │  AvailabilityLedger  │◄───────│    AssignmentRoster     │  │
//! │  │  (attendance cache)  │        │  (roster cache, members)│  │
//! │  └──────────┬───────────┘        └────────────┬────────────┘  │
//! └─────────────┼─────────────────────────────────┼───────────────┘
//!               │                                 │
//!               ▼                                 ▼
//!        ┌───────────────┐                ┌────────────────────┐
//!        │  attendance   │                │ service_schedules  │
//!        └───────────────┘                └────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`week`] - Sunday-anchored week numbering (service and set-list variants)
//! - [`availability`] - Per-member availability ledger with upsert semantics
//! - [`cache`] - Bounded per-month record cache shared by ledger and roster
//! - [`roster`] - Eligibility and per-date roster persistence
//! - [`facade`] - Month-scoped view composing the above
//!
//! # Quick Start
//!
//! ```ignore
//! use hiel::scheduler::Scheduler;
//! use hiel::models::{AvailabilityStatus, EventType, Position, YearMonth};
//!
//! let scheduler = Scheduler::with_member_limit(store, 100);
//! scheduler.open_month(YearMonth::new(2024, 6).unwrap()).await?;
//!
//! scheduler
//!     .set_availability(&kim.id, "Kim", date, EventType::SundayWorship, AvailabilityStatus::Available)
//!     .await?;
//! let drummers = scheduler.get_available_members(date, Position::Drums).await?;
//! ```
//!
//! # Concurrency
//!
//! Writes within one process are serialized per component, so two toggles
//! for the same key never create two records. Across processes the store
//! is last-write-wins.

pub mod availability;
pub mod cache;
pub mod error;
pub mod facade;
pub mod roster;
pub mod week;

pub use availability::{status_in, AvailabilityLedger};
pub use cache::{MonthCache, CACHED_MONTHS};
pub use error::{SchedulerError, SchedulerResult};
pub use facade::{MonthView, PositionSlot, PracticeDay, ResponseSummary, Scheduler, ServiceDay};
pub use roster::{eligible_members, AssignmentRoster};
pub use week::{saturdays_in_month, service_week_number, setlist_week_number, sundays_in_month};

use chrono::NaiveDate;

use crate::models::{AvailabilityStatus, Position, YearMonth};

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(input: &str) -> SchedulerResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| SchedulerError::invalid_date(input))
}

/// Parse a `YYYY-MM` month
pub fn parse_month(input: &str) -> SchedulerResult<YearMonth> {
    input
        .trim()
        .parse()
        .map_err(|_| SchedulerError::invalid_month(input))
}

/// Parse a position by Korean label or id
pub fn parse_position(input: &str) -> SchedulerResult<Position> {
    input
        .parse()
        .map_err(|_| SchedulerError::invalid_position(input))
}

/// Parse an availability answer; `pending` is not an answer
pub fn parse_answer(input: &str) -> SchedulerResult<AvailabilityStatus> {
    match input.parse::<AvailabilityStatus>() {
        Ok(AvailabilityStatus::Pending) | Err(_) => Err(SchedulerError::invalid_status(input)),
        Ok(status) => Ok(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_helpers() {
        assert_eq!(
            parse_date("2024-06-02").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
        );
        assert!(matches!(parse_date("06/02/2024"), Err(SchedulerError::InvalidDate { .. })));
        assert_eq!(parse_month("2024-06").unwrap().month(), 6);
        assert!(parse_month("2024-6").is_err());
        assert_eq!(parse_position("드럼").unwrap(), Position::Drums);
        assert!(matches!(parse_position("보컬"), Err(SchedulerError::InvalidPosition { .. })));
    }

    #[test]
    fn test_parse_answer_rejects_pending() {
        assert_eq!(parse_answer("available").unwrap(), AvailabilityStatus::Available);
        assert!(parse_answer("pending").is_err());
        assert!(parse_answer("maybe").is_err());
    }
}
