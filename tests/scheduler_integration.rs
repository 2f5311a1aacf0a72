//! Integration tests for the worship scheduler
//!
//! These tests drive the public facade against both store backends:
//! - Availability upserts and eligibility
//! - Roster upserts
//! - Week numbering
//! - Month views

mod common;

use common::{create_test_stores, seed_member, seed_team, ymd};
use hiel::models::{
    Assignment, Assignments, AttendanceRecord, AvailabilityStatus, EventType, Position,
    RosterStatus, YearMonth,
};
use hiel::scheduler::{service_week_number, Scheduler, SchedulerError};
use hiel::store::Collection;

fn names(members: &[hiel::store::Stored<hiel::models::Member>]) -> Vec<String> {
    members.iter().map(|m| m.name.clone()).collect()
}

// ============================================================================
// Availability
// ============================================================================

#[tokio::test]
async fn test_kim_available_then_unavailable() {
    for store in create_test_stores() {
        let kim = seed_member(&store, "Kim", &[Position::Drums]).await;
        let scheduler = Scheduler::new(store.clone());
        let sunday = ymd(2024, 6, 2);

        scheduler
            .set_availability(&kim.id, "Kim", sunday, EventType::SundayWorship, AvailabilityStatus::Available)
            .await
            .unwrap();
        let drummers = scheduler
            .get_available_members(sunday, Position::Drums)
            .await
            .unwrap();
        assert_eq!(names(&drummers), vec!["Kim"], "backend {}", store.backend_name());

        scheduler
            .set_availability(&kim.id, "Kim", sunday, EventType::SundayWorship, AvailabilityStatus::Unavailable)
            .await
            .unwrap();
        let drummers = scheduler
            .get_available_members(sunday, Position::Drums)
            .await
            .unwrap();
        assert!(drummers.is_empty(), "backend {}", store.backend_name());
    }
}

#[tokio::test]
async fn test_repeated_answer_keeps_one_record() {
    for store in create_test_stores() {
        let scheduler = Scheduler::new(store.clone());
        let sunday = ymd(2024, 6, 2);

        for _ in 0..2 {
            scheduler
                .set_availability("m1", "Kim", sunday, EventType::SundayWorship, AvailabilityStatus::Available)
                .await
                .unwrap();
        }

        let records = Collection::<AttendanceRecord>::new(store.clone())
            .filter(&serde_json::Map::new())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AvailabilityStatus::Available);
    }
}

#[tokio::test]
async fn test_concurrent_answers_keep_one_record() {
    let store = hiel::store::create_memory_store();
    let scheduler = std::sync::Arc::new(Scheduler::new(store.clone()));
    let sunday = ymd(2024, 6, 9);

    let mut handles = Vec::new();
    for status in [AvailabilityStatus::Available, AvailabilityStatus::Unavailable] {
        let scheduler = scheduler.clone();
        handles.push(tokio::spawn(async move {
            scheduler
                .set_availability("m1", "Kim", sunday, EventType::SundayWorship, status)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let records = Collection::<AttendanceRecord>::new(store)
        .filter(&serde_json::Map::new())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_event_types_are_independent() {
    let store = hiel::store::create_memory_store();
    let scheduler = Scheduler::new(store);
    let sunday = ymd(2024, 6, 2);

    scheduler
        .set_availability("m1", "Kim", ymd(2024, 6, 1), EventType::SaturdayPractice, AvailabilityStatus::Available)
        .await
        .unwrap();

    let status = scheduler
        .get_status("m1", sunday, EventType::SundayWorship)
        .await
        .unwrap();
    assert_eq!(status, AvailabilityStatus::Pending);
}

#[tokio::test]
async fn test_pending_is_not_an_answer() {
    let scheduler = Scheduler::new(hiel::store::create_memory_store());
    let result = scheduler
        .set_availability("m1", "Kim", ymd(2024, 6, 2), EventType::SundayWorship, AvailabilityStatus::Pending)
        .await;
    assert!(matches!(result, Err(SchedulerError::InvalidStatus { .. })));
}

#[tokio::test]
async fn test_eligibility_requires_position_and_available() {
    for store in create_test_stores() {
        let (kim, lee, park) = seed_team(&store).await;
        let scheduler = Scheduler::new(store.clone());
        let sunday = ymd(2024, 6, 16);

        for member in [&kim, &lee] {
            scheduler
                .set_availability(&member.id, &member.name, sunday, EventType::SundayWorship, AvailabilityStatus::Available)
                .await
                .unwrap();
        }
        // Park holds drums but never answered

        let drummers = scheduler
            .get_available_members(sunday, Position::Drums)
            .await
            .unwrap();
        assert_eq!(names(&drummers), vec!["Kim"]);
        assert!(!names(&drummers).contains(&park.name));

        let leaders = scheduler
            .get_available_members(sunday, Position::WorshipLeader)
            .await
            .unwrap();
        assert_eq!(names(&leaders), vec!["Lee"]);
    }
}

// ============================================================================
// Roster
// ============================================================================

#[tokio::test]
async fn test_roster_upsert_replaces_assignments() {
    for store in create_test_stores() {
        let scheduler = Scheduler::new(store.clone());
        let sunday = ymd(2024, 6, 2);

        let mut first = Assignments::new();
        first.insert(Position::Drums, Assignment::from("Kim"));
        first.insert(Position::BassGuitar, Assignment::from("Park"));
        let draft = scheduler
            .save_assignments(sunday, first, RosterStatus::Draft)
            .await
            .unwrap();

        let mut second = Assignments::new();
        second.insert(Position::Drums, Assignment::from("Lee"));
        let confirmed = scheduler
            .save_assignments(sunday, second, RosterStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(draft.id, confirmed.id);

        let roster = scheduler.get_roster(sunday).await.unwrap().unwrap();
        assert_eq!(roster.status, RosterStatus::Confirmed);
        assert_eq!(roster.assignments.len(), 1);
        assert_eq!(
            roster.assigned(Position::Drums),
            Some(&Assignment::from("Lee"))
        );
        assert!(roster.assigned(Position::BassGuitar).is_none());
    }
}

#[tokio::test]
async fn test_roster_accepts_unavailable_member() {
    let store = hiel::store::create_memory_store();
    let kim = seed_member(&store, "Kim", &[Position::Drums]).await;
    let scheduler = Scheduler::new(store);
    let sunday = ymd(2024, 6, 2);

    scheduler
        .set_availability(&kim.id, "Kim", sunday, EventType::SundayWorship, AvailabilityStatus::Unavailable)
        .await
        .unwrap();

    let mut assignments = Assignments::new();
    assignments.insert(Position::Drums, Assignment::from("Kim"));
    let saved = scheduler
        .save_assignments(sunday, assignments, RosterStatus::Confirmed)
        .await
        .unwrap();
    assert!(saved.is_confirmed());
}

#[tokio::test]
async fn test_missing_roster_is_none() {
    let scheduler = Scheduler::new(hiel::store::create_memory_store());
    assert!(scheduler.get_roster(ymd(2024, 6, 2)).await.unwrap().is_none());
}

// ============================================================================
// Week numbering
// ============================================================================

#[test]
fn test_saturday_shares_sunday_week() {
    assert_eq!(
        service_week_number(ymd(2024, 6, 1)),
        service_week_number(ymd(2024, 6, 2))
    );
}

#[test]
fn test_first_sunday_is_week_one_when_month_starts_on_sunday() {
    assert_eq!(service_week_number(ymd(2024, 9, 1)), 1);
    assert_eq!(service_week_number(ymd(2024, 12, 1)), 1);
}

// ============================================================================
// Month view
// ============================================================================

#[tokio::test]
async fn test_month_view_counts_and_flags() {
    for store in create_test_stores() {
        let (kim, lee, _park) = seed_team(&store).await;
        let scheduler = Scheduler::new(store.clone());
        let june = YearMonth::new(2024, 6).unwrap();
        let sunday = ymd(2024, 6, 2);

        scheduler
            .set_availability(&kim.id, "Kim", sunday, EventType::SundayWorship, AvailabilityStatus::Available)
            .await
            .unwrap();
        scheduler
            .set_availability(&lee.id, "Lee", sunday, EventType::SundayWorship, AvailabilityStatus::Unavailable)
            .await
            .unwrap();

        let view = scheduler.open_month(june).await.unwrap();
        assert_eq!(view.member_count, 3);
        assert_eq!(view.sundays.len(), 5);
        assert_eq!(view.saturdays.len(), 5);

        let day = view.sunday(sunday).unwrap();
        assert_eq!(day.responses.available, 1);
        assert_eq!(day.responses.unavailable, 1);
        assert_eq!(day.responses.pending, 1);
        assert!(day.roster_status.is_none());

        let drums = day.slot(Position::Drums).unwrap();
        assert_eq!(drums.available_members, vec!["Kim".to_string()]);
        assert!(!drums.no_eligible_members);
        assert!(day.slot(Position::WorshipLeader).unwrap().no_eligible_members);
    }
}

#[tokio::test]
async fn test_switch_month_moves_window() {
    let scheduler = Scheduler::new(hiel::store::create_memory_store());

    assert!(matches!(
        scheduler.switch_month(1).await,
        Err(SchedulerError::NoMonthOpen)
    ));

    scheduler
        .open_month(YearMonth::new(2024, 12).unwrap())
        .await
        .unwrap();
    let view = scheduler.switch_month(1).await.unwrap();
    assert_eq!(view.year_month, YearMonth::new(2025, 1).unwrap());
    assert_eq!(
        scheduler.current_month().await,
        Some(YearMonth::new(2025, 1).unwrap())
    );
}

#[tokio::test]
async fn test_null_slot_in_stored_roster_is_unfilled() {
    for store in create_test_stores() {
        let raw = serde_json::json!({
            "date": "2024-06-09",
            "assignments": { "드럼": null, "인도자": "Lee" },
            "status": "confirmed"
        });
        store
            .create("service_schedules", raw.as_object().unwrap().clone())
            .await
            .unwrap();

        let scheduler = Scheduler::new(store.clone());
        let view = scheduler
            .open_month(YearMonth::new(2024, 6).unwrap())
            .await
            .unwrap();
        let sunday = view.sunday(ymd(2024, 6, 9)).unwrap();
        assert!(sunday.slot(Position::Drums).unwrap().assigned.is_none());
        assert_eq!(
            sunday.slot(Position::WorshipLeader).unwrap().assigned,
            Some(Assignment::from("Lee"))
        );
        assert_eq!(sunday.roster_status, Some(RosterStatus::Confirmed));
    }
}
