//! Availability ledger
//!
//! One record per (member, date, event type). Records are bucketed by
//! `year_month` and cached per month; every write reloads its month so
//! later reads observe it. Only the last few loaded months stay cached.

use chrono::NaiveDate;
use serde_json::json;
use tokio::sync::{Mutex, RwLock};

use crate::models::{AttendanceRecord, AvailabilityStatus, EventType, YearMonth};
use crate::store::{criteria, Collection, SharedDocumentStore, Stored};

use super::cache::MonthCache;
use super::error::{SchedulerError, SchedulerResult};

/// Status for a key within a set of records; `Pending` when absent
pub fn status_in(
    records: &[Stored<AttendanceRecord>],
    member_id: &str,
    date: NaiveDate,
    event_type: EventType,
) -> AvailabilityStatus {
    records
        .iter()
        .find(|r| r.matches(member_id, date, event_type))
        .map(|r| r.status)
        .unwrap_or(AvailabilityStatus::Pending)
}

/// Per-member, per-date attendance answers
pub struct AvailabilityLedger {
    attendance: Collection<AttendanceRecord>,
    months: RwLock<MonthCache<AttendanceRecord>>,
    write_lock: Mutex<()>,
}

impl AvailabilityLedger {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            attendance: Collection::new(store),
            months: RwLock::new(MonthCache::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Refetch every record in the month's bucket and replace the cache
    pub async fn load_month(
        &self,
        year_month: YearMonth,
    ) -> SchedulerResult<Vec<Stored<AttendanceRecord>>> {
        let records = self
            .attendance
            .filter(&criteria([("year_month", json!(year_month))]))
            .await
            .map_err(|e| SchedulerError::store("load attendance", e))?;

        tracing::debug!(
            year_month = %year_month,
            count = records.len(),
            "Attendance month loaded"
        );

        self.months.write().await.insert(year_month, records.clone());
        Ok(records)
    }

    /// Cached records for a month, loading it on first use
    pub async fn records(
        &self,
        year_month: YearMonth,
    ) -> SchedulerResult<Vec<Stored<AttendanceRecord>>> {
        if let Some(records) = self.months.read().await.get(&year_month) {
            return Ok(records.clone());
        }
        self.load_month(year_month).await
    }

    /// Drop every cached month
    pub async fn invalidate(&self) {
        self.months.write().await.clear();
    }

    /// Months currently cached, oldest load first
    pub async fn cached_months(&self) -> Vec<YearMonth> {
        self.months.read().await.months()
    }

    /// Status for a key, `Pending` when the member never answered
    pub async fn get_status(
        &self,
        member_id: &str,
        date: NaiveDate,
        event_type: EventType,
    ) -> SchedulerResult<AvailabilityStatus> {
        let records = self.records(YearMonth::from_date(date)).await?;
        Ok(status_in(&records, member_id, date, event_type))
    }

    /// Record a member's answer, overwriting any previous one for the key
    pub async fn set_availability(
        &self,
        member_id: &str,
        member_name: &str,
        date: NaiveDate,
        event_type: EventType,
        status: AvailabilityStatus,
    ) -> SchedulerResult<Stored<AttendanceRecord>> {
        if status == AvailabilityStatus::Pending {
            return Err(SchedulerError::invalid_status(status.as_str()));
        }

        let _guard = self.write_lock.lock().await;
        let year_month = YearMonth::from_date(date);
        let records = self.records(year_month).await?;

        let existing = records
            .iter()
            .find(|r| r.matches(member_id, date, event_type));

        let saved = match existing {
            Some(record) => self
                .attendance
                .patch(&record.id, criteria([("status", json!(status))]))
                .await
                .map_err(|e| SchedulerError::store("update attendance", e))?,
            None => {
                let record =
                    AttendanceRecord::new(member_id, member_name, date, event_type, status);
                self.attendance
                    .create(&record)
                    .await
                    .map_err(|e| SchedulerError::store("create attendance", e))?
            }
        };

        tracing::info!(
            member_id,
            date = %date,
            event_type = %event_type,
            status = %status,
            "Availability recorded"
        );

        self.load_month(year_month).await?;
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::cache::CACHED_MONTHS;
    use crate::store::create_memory_store;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_absent_record_is_pending() {
        let ledger = AvailabilityLedger::new(create_memory_store());
        let status = ledger
            .get_status("m1", ymd(2024, 6, 2), EventType::SundayWorship)
            .await
            .unwrap();
        assert_eq!(status, AvailabilityStatus::Pending);
    }

    #[tokio::test]
    async fn test_second_write_overwrites() {
        let store = create_memory_store();
        let ledger = AvailabilityLedger::new(store.clone());
        let date = ymd(2024, 6, 2);

        let first = ledger
            .set_availability("m1", "Kim", date, EventType::SundayWorship, AvailabilityStatus::Available)
            .await
            .unwrap();
        let second = ledger
            .set_availability("m1", "Kim", date, EventType::SundayWorship, AvailabilityStatus::Unavailable)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.version, 2);
        assert_eq!(second.member_name, "Kim");

        let month = ledger.records(YearMonth::from_date(date)).await.unwrap();
        assert_eq!(month.len(), 1);
        assert_eq!(month[0].status, AvailabilityStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_event_types_are_separate_keys() {
        let ledger = AvailabilityLedger::new(create_memory_store());
        let date = ymd(2024, 6, 2);

        ledger
            .set_availability("m1", "Kim", date, EventType::SundayWorship, AvailabilityStatus::Available)
            .await
            .unwrap();

        assert_eq!(
            ledger.get_status("m1", date, EventType::SaturdayPractice).await.unwrap(),
            AvailabilityStatus::Pending
        );
        assert_eq!(
            ledger.get_status("m1", date, EventType::SundayWorship).await.unwrap(),
            AvailabilityStatus::Available
        );
    }

    #[tokio::test]
    async fn test_pending_input_rejected() {
        let ledger = AvailabilityLedger::new(create_memory_store());
        let err = ledger
            .set_availability("m1", "Kim", ymd(2024, 6, 2), EventType::SundayWorship, AvailabilityStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidStatus { .. }));
    }

    #[tokio::test]
    async fn test_cache_sees_writes_from_other_handles_after_reload() {
        let store = create_memory_store();
        let reader = AvailabilityLedger::new(store.clone());
        let writer = AvailabilityLedger::new(store);
        let date = ymd(2024, 6, 9);
        let month = YearMonth::from_date(date);

        assert!(reader.records(month).await.unwrap().is_empty());
        writer
            .set_availability("m2", "Lee", date, EventType::SundayWorship, AvailabilityStatus::Available)
            .await
            .unwrap();

        // still the cached view until the month is refetched
        assert!(reader.records(month).await.unwrap().is_empty());
        assert_eq!(reader.load_month(month).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_browsing_many_months_keeps_cache_bounded() {
        let ledger = AvailabilityLedger::new(create_memory_store());
        for month in 1..=12 {
            ledger
                .records(YearMonth::new(2024, month).unwrap())
                .await
                .unwrap();
        }

        let cached = ledger.cached_months().await;
        assert_eq!(cached.len(), CACHED_MONTHS);
        assert_eq!(cached.last(), Some(&YearMonth::new(2024, 12).unwrap()));
        assert!(!cached.contains(&YearMonth::new(2024, 1).unwrap()));
    }
}
