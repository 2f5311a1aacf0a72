//! Common test utilities

#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use hiel::models::{Member, Position};
use hiel::store::{
    create_memory_store, Collection, SharedDocumentStore, SqliteDocumentStore, Stored,
};
use std::sync::Arc;

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One store per backend, both empty
pub fn create_test_stores() -> Vec<SharedDocumentStore> {
    vec![
        Arc::new(SqliteDocumentStore::in_memory().unwrap()),
        create_memory_store(),
    ]
}

/// Store a member holding the given positions
pub async fn seed_member(
    store: &SharedDocumentStore,
    name: &str,
    positions: &[Position],
) -> Stored<Member> {
    let member = positions
        .iter()
        .fold(Member::new(name), |m, p| m.with_position(*p));
    Collection::<Member>::new(store.clone())
        .create(&member)
        .await
        .unwrap()
}

/// Kim and Park on drums, Lee leading and singing
pub async fn seed_team(store: &SharedDocumentStore) -> (Stored<Member>, Stored<Member>, Stored<Member>) {
    let kim = seed_member(store, "Kim", &[Position::Drums]).await;
    let lee = seed_member(store, "Lee", &[Position::WorshipLeader, Position::MaleSinger]).await;
    let park = seed_member(store, "Park", &[Position::Drums, Position::BassGuitar]).await;
    (kim, lee, park)
}

/// Store a member who is 팀장 for the current year
pub async fn seed_leader(store: &SharedDocumentStore, name: &str) -> Stored<Member> {
    let year = chrono::Local::now().year();
    Collection::<Member>::new(store.clone())
        .create(&Member::new(name).with_role(year, "팀장"))
        .await
        .unwrap()
}
