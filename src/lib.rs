//! hiel - Worship-team scheduler
//!
//! Tracks which team members can serve each Sunday service and Saturday
//! practice, and which member is assigned to each position, on top of a
//! schemaless document store.
//!
//! # Architecture
//!
//! - [`config`] - Configuration management and settings
//! - [`store`] - Document store client (SQLite and in-memory backends)
//! - [`models`] - Typed records stored in the document store
//! - [`scheduler`] - Week classifier, availability ledger, assignment roster
//! - [`session`] - Current user and permission gating
//! - [`team`] - Member directory, boards, set-lists, songs, meetings and
//!   surveys, calendar, service archive
//! - [`server`] - HTTP API
//!
//! # Example
//!
//! ```no_run
//! use hiel::models::{AvailabilityStatus, EventType, Position};
//! use hiel::scheduler::Scheduler;
//! use hiel::store::create_memory_store;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scheduler = Scheduler::new(create_memory_store());
//!     let sunday = chrono::NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
//!
//!     scheduler
//!         .set_availability("m1", "Kim", sunday, EventType::SundayWorship, AvailabilityStatus::Available)
//!         .await?;
//!     let drummers = scheduler.get_available_members(sunday, Position::Drums).await?;
//!     println!("{} drummer(s) available", drummers.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod store;
pub mod team;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, HielErrorTrait, Result};
    pub use crate::models::{
        AttendanceRecord, AvailabilityStatus, EventType, Member, Position, RosterRecord,
        RosterStatus, YearMonth,
    };
    pub use crate::scheduler::Scheduler;
    pub use crate::session::Session;
    pub use crate::store::{Collection, DocumentStore, SharedDocumentStore, Stored};
}

pub use error::{Error, ErrorCategory, HielErrorTrait, Result};
