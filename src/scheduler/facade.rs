//! Month-scoped scheduler facade
//!
//! Holds the month currently on screen and builds its [`MonthView`]. Every
//! open or switch refetches the whole month. Each open takes a new
//! generation number; a fetch that finishes after a newer open started is
//! discarded instead of replacing the newer month.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::models::{
    Assignment, Assignments, AttendanceRecord, AvailabilityStatus, EventType, Member, Position,
    RosterRecord, RosterStatus, YearMonth,
};
use crate::store::{SharedDocumentStore, Stored, DEFAULT_LIST_LIMIT};

use super::availability::{status_in, AvailabilityLedger};
use super::error::{SchedulerError, SchedulerResult};
use super::roster::{eligible_members, AssignmentRoster};
use super::week::{saturdays_in_month, service_week_number, sundays_in_month};

// ============================================================================
// Month view
// ============================================================================

/// Count of answers for one date and event type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResponseSummary {
    pub available: usize,
    pub unavailable: usize,
    pub pending: usize,
}

impl ResponseSummary {
    fn tally(
        members: &[Stored<Member>],
        attendance: &[Stored<AttendanceRecord>],
        date: NaiveDate,
        event_type: EventType,
    ) -> Self {
        let mut summary = Self::default();
        for member in members {
            match status_in(attendance, &member.id, date, event_type) {
                AvailabilityStatus::Available => summary.available += 1,
                AvailabilityStatus::Unavailable => summary.unavailable += 1,
                AvailabilityStatus::Pending => summary.pending += 1,
            }
        }
        summary
    }
}

/// One position on one Sunday
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSlot {
    pub position: Position,
    pub available_count: usize,
    pub available_members: Vec<String>,
    /// Advisory only; the position stays assignable
    pub no_eligible_members: bool,
    pub allows_multiple: bool,
    pub assigned: Option<Assignment>,
}

/// A Sunday service in the month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDay {
    pub date: NaiveDate,
    pub week_number: u32,
    pub responses: ResponseSummary,
    /// `None` until a roster is first saved for the date
    pub roster_status: Option<RosterStatus>,
    pub positions: Vec<PositionSlot>,
}

impl ServiceDay {
    pub fn slot(&self, position: Position) -> Option<&PositionSlot> {
        self.positions.iter().find(|s| s.position == position)
    }
}

/// A Saturday practice in the month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeDay {
    pub date: NaiveDate,
    pub week_number: u32,
    pub responses: ResponseSummary,
}

/// Everything the presentation layer needs for one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub year_month: YearMonth,
    pub label: String,
    pub member_count: usize,
    pub sundays: Vec<ServiceDay>,
    pub saturdays: Vec<PracticeDay>,
}

impl MonthView {
    pub fn build(
        year_month: YearMonth,
        members: &[Stored<Member>],
        attendance: &[Stored<AttendanceRecord>],
        rosters: &[Stored<RosterRecord>],
    ) -> Self {
        let sundays = sundays_in_month(year_month)
            .into_iter()
            .map(|date| {
                let roster = rosters.iter().find(|r| r.date == date);
                let positions = Position::all()
                    .into_iter()
                    .map(|position| {
                        let available: Vec<String> =
                            eligible_members(members, attendance, date, position)
                                .into_iter()
                                .map(|m| m.name.clone())
                                .collect();
                        PositionSlot {
                            position,
                            available_count: available.len(),
                            no_eligible_members: available.is_empty(),
                            available_members: available,
                            allows_multiple: position.allows_multiple(),
                            assigned: roster.and_then(|r| r.assigned(position).cloned()),
                        }
                    })
                    .collect();

                ServiceDay {
                    date,
                    week_number: service_week_number(date),
                    responses: ResponseSummary::tally(
                        members,
                        attendance,
                        date,
                        EventType::SundayWorship,
                    ),
                    roster_status: roster.map(|r| r.status),
                    positions,
                }
            })
            .collect();

        let saturdays = saturdays_in_month(year_month)
            .into_iter()
            .map(|date| PracticeDay {
                date,
                week_number: service_week_number(date),
                responses: ResponseSummary::tally(
                    members,
                    attendance,
                    date,
                    EventType::SaturdayPractice,
                ),
            })
            .collect();

        Self {
            year_month,
            label: year_month.korean_label(),
            member_count: members.len(),
            sundays,
            saturdays,
        }
    }

    pub fn sunday(&self, date: NaiveDate) -> Option<&ServiceDay> {
        self.sundays.iter().find(|d| d.date == date)
    }
}

// ============================================================================
// Scheduler
// ============================================================================

struct OpenMonth {
    year_month: YearMonth,
    members: Vec<Stored<Member>>,
}

/// Ledger and roster composed around the month on screen
pub struct Scheduler {
    ledger: Arc<AvailabilityLedger>,
    roster: Arc<AssignmentRoster>,
    generation: AtomicU64,
    open: RwLock<Option<OpenMonth>>,
}

impl Scheduler {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self::with_member_limit(store, DEFAULT_LIST_LIMIT)
    }

    /// Scheduler whose member directory fetch is capped at `limit`
    pub fn with_member_limit(store: SharedDocumentStore, limit: usize) -> Self {
        let ledger = Arc::new(AvailabilityLedger::new(store.clone()));
        let roster =
            Arc::new(AssignmentRoster::new(store, ledger.clone()).with_member_limit(limit));
        Self::from_parts(ledger, roster)
    }

    pub fn from_parts(ledger: Arc<AvailabilityLedger>, roster: Arc<AssignmentRoster>) -> Self {
        Self {
            ledger,
            roster,
            generation: AtomicU64::new(0),
            open: RwLock::new(None),
        }
    }

    pub fn ledger(&self) -> &AvailabilityLedger {
        &self.ledger
    }

    pub fn roster(&self) -> &AssignmentRoster {
        &self.roster
    }

    /// Month currently open, if any
    pub async fn current_month(&self) -> Option<YearMonth> {
        self.open.read().await.as_ref().map(|m| m.year_month)
    }

    async fn fetch_month(
        &self,
        year_month: YearMonth,
    ) -> SchedulerResult<(
        Vec<Stored<Member>>,
        Vec<Stored<AttendanceRecord>>,
        Vec<Stored<RosterRecord>>,
    )> {
        tokio::try_join!(
            self.roster.members(),
            self.ledger.load_month(year_month),
            self.roster.load_month(year_month),
        )
    }

    /// Freshly fetched view of any month; the open month is left alone
    pub async fn view_month(&self, year_month: YearMonth) -> SchedulerResult<MonthView> {
        let (members, attendance, rosters) = self.fetch_month(year_month).await?;
        Ok(MonthView::build(year_month, &members, &attendance, &rosters))
    }

    /// Fetch members, attendance and rosters for a month and make it current
    pub async fn open_month(&self, year_month: YearMonth) -> SchedulerResult<MonthView> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (members, attendance, rosters) = self.fetch_month(year_month).await?;

        let mut open = self.open.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            let current = open.as_ref().map(|m| m.year_month).unwrap_or(year_month);
            tracing::debug!(requested = %year_month, current = %current, "Stale month fetch dropped");
            return Err(SchedulerError::Superseded {
                requested: year_month,
                current,
            });
        }

        let view = MonthView::build(year_month, &members, &attendance, &rosters);
        *open = Some(OpenMonth {
            year_month,
            members,
        });

        tracing::info!(year_month = %year_month, "Month opened");
        Ok(view)
    }

    /// Move the open month by `delta` months and refetch
    pub async fn switch_month(&self, delta: i32) -> SchedulerResult<MonthView> {
        let current = self
            .current_month()
            .await
            .ok_or(SchedulerError::NoMonthOpen)?;
        self.open_month(current.offset(delta)).await
    }

    /// View of the open month from cached records
    pub async fn month_view(&self) -> SchedulerResult<MonthView> {
        let open = self.open.read().await;
        let month = open.as_ref().ok_or(SchedulerError::NoMonthOpen)?;

        let attendance = self.ledger.records(month.year_month).await?;
        let rosters = self.roster.rosters(month.year_month).await?;
        Ok(MonthView::build(
            month.year_month,
            &month.members,
            &attendance,
            &rosters,
        ))
    }

    pub async fn set_availability(
        &self,
        member_id: &str,
        member_name: &str,
        date: NaiveDate,
        event_type: EventType,
        status: AvailabilityStatus,
    ) -> SchedulerResult<Stored<AttendanceRecord>> {
        self.ledger
            .set_availability(member_id, member_name, date, event_type, status)
            .await
    }

    pub async fn get_status(
        &self,
        member_id: &str,
        date: NaiveDate,
        event_type: EventType,
    ) -> SchedulerResult<AvailabilityStatus> {
        self.ledger.get_status(member_id, date, event_type).await
    }

    pub async fn get_available_members(
        &self,
        date: NaiveDate,
        position: Position,
    ) -> SchedulerResult<Vec<Stored<Member>>> {
        self.roster.get_available_members(date, position).await
    }

    pub async fn save_assignments(
        &self,
        date: NaiveDate,
        assignments: Assignments,
        status: RosterStatus,
    ) -> SchedulerResult<Stored<RosterRecord>> {
        self.roster.save_assignments(date, assignments, status).await
    }

    pub async fn get_roster(&self, date: NaiveDate) -> SchedulerResult<Option<Stored<RosterRecord>>> {
        self.roster.get_roster(date).await
    }
}
