//! Assignment roster
//!
//! One roster record per service date. Saving replaces the whole
//! assignment map; nothing checks that assignees hold the position or were
//! available, and a confirmed roster can be saved again.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};

use crate::models::{
    AttendanceRecord, Assignments, AvailabilityStatus, EventType, Member, Position, RosterRecord,
    RosterStatus, YearMonth,
};
use crate::store::{Collection, Fields, SharedDocumentStore, Stored, DEFAULT_LIST_LIMIT};

use super::availability::{status_in, AvailabilityLedger};
use super::cache::MonthCache;
use super::error::{SchedulerError, SchedulerResult};

/// Members holding `position` whose Sunday answer for `date` is `Available`
///
/// Pending and unavailable members are excluded even when they hold the
/// position.
pub fn eligible_members<'a>(
    members: &'a [Stored<Member>],
    attendance: &[Stored<AttendanceRecord>],
    date: NaiveDate,
    position: Position,
) -> Vec<&'a Stored<Member>> {
    members
        .iter()
        .filter(|m| m.holds(position))
        .filter(|m| {
            status_in(attendance, &m.id, date, EventType::SundayWorship)
                == AvailabilityStatus::Available
        })
        .collect()
}

/// Per-date position assignments with a draft/confirmed status
pub struct AssignmentRoster {
    members: Collection<Member>,
    rosters: Collection<RosterRecord>,
    ledger: Arc<AvailabilityLedger>,
    member_limit: usize,
    months: RwLock<MonthCache<RosterRecord>>,
    write_lock: Mutex<()>,
}

impl AssignmentRoster {
    pub fn new(store: SharedDocumentStore, ledger: Arc<AvailabilityLedger>) -> Self {
        Self {
            members: Collection::new(store.clone()),
            rosters: Collection::new(store),
            ledger,
            member_limit: DEFAULT_LIST_LIMIT,
            months: RwLock::new(MonthCache::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Cap on the member directory fetch
    pub fn with_member_limit(mut self, limit: usize) -> Self {
        self.member_limit = limit;
        self
    }

    /// Team members ordered by name
    pub async fn members(&self) -> SchedulerResult<Vec<Stored<Member>>> {
        self.members
            .list("name", self.member_limit)
            .await
            .map_err(|e| SchedulerError::store("list members", e))
    }

    /// Refetch the month's rosters, ordered by date
    pub async fn load_month(
        &self,
        year_month: YearMonth,
    ) -> SchedulerResult<Vec<Stored<RosterRecord>>> {
        let mut rosters = self
            .rosters
            .filter(&Fields::new())
            .await
            .map_err(|e| SchedulerError::store("load rosters", e))?;
        rosters.retain(|r| year_month.contains(r.date));
        rosters.sort_by_key(|r| r.date);

        tracing::debug!(year_month = %year_month, count = rosters.len(), "Rosters loaded");

        self.months.write().await.insert(year_month, rosters.clone());
        Ok(rosters)
    }

    /// Cached rosters for a month, loading it on first use
    pub async fn rosters(&self, year_month: YearMonth) -> SchedulerResult<Vec<Stored<RosterRecord>>> {
        if let Some(rosters) = self.months.read().await.get(&year_month) {
            return Ok(rosters.clone());
        }
        self.load_month(year_month).await
    }

    /// Months currently cached, oldest load first
    pub async fn cached_months(&self) -> Vec<YearMonth> {
        self.months.read().await.months()
    }

    pub fn member_limit(&self) -> usize {
        self.member_limit
    }

    /// Roster saved for `date`, if any
    pub async fn get_roster(&self, date: NaiveDate) -> SchedulerResult<Option<Stored<RosterRecord>>> {
        let rosters = self.rosters(YearMonth::from_date(date)).await?;
        Ok(rosters.into_iter().find(|r| r.date == date))
    }

    /// Who can serve `position` on `date`
    pub async fn get_available_members(
        &self,
        date: NaiveDate,
        position: Position,
    ) -> SchedulerResult<Vec<Stored<Member>>> {
        let members = self.members().await?;
        let attendance = self.ledger.records(YearMonth::from_date(date)).await?;

        Ok(eligible_members(&members, &attendance, date, position)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Create or overwrite the roster for `date`
    pub async fn save_assignments(
        &self,
        date: NaiveDate,
        assignments: Assignments,
        status: RosterStatus,
    ) -> SchedulerResult<Stored<RosterRecord>> {
        let _guard = self.write_lock.lock().await;
        let year_month = YearMonth::from_date(date);
        let existing = self
            .rosters(year_month)
            .await?
            .into_iter()
            .find(|r| r.date == date);

        let saved = match existing {
            Some(current) => {
                let record = RosterRecord {
                    date,
                    event_type: current.event_type,
                    assignments,
                    status,
                };
                self.rosters
                    .update(&current.id, &record)
                    .await
                    .map_err(|e| SchedulerError::store("update roster", e))?
            }
            None => self
                .rosters
                .create(&RosterRecord::new(date, assignments, status))
                .await
                .map_err(|e| SchedulerError::store("create roster", e))?,
        };

        let unfilled = saved.unfilled_positions().len();
        if saved.is_confirmed() && unfilled > 0 {
            tracing::warn!(date = %date, unfilled, "Roster confirmed with unfilled positions");
        }
        tracing::info!(date = %date, status = %status, version = saved.version, "Roster saved");

        self.load_month(year_month).await?;
        Ok(saved)
    }
}
