//! Team calendar: events by date and member birthdays

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use crate::error::Result;
use crate::models::{CalendarEvent, Member, YearMonth};
use crate::session::Session;
use crate::store::{criteria, Collection, SharedDocumentStore, Stored, DEFAULT_LIST_LIMIT};

use super::members::MemberDirectory;

/// Everything shown on one calendar day
#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub events: Vec<Stored<CalendarEvent>>,
    pub birthdays: Vec<Stored<Member>>,
}

pub struct TeamCalendar {
    events: Collection<CalendarEvent>,
    members: MemberDirectory,
    list_limit: usize,
}

impl TeamCalendar {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            events: Collection::new(store.clone()),
            members: MemberDirectory::new(store),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self.members = self.members.with_list_limit(limit);
        self
    }

    /// All events by date
    pub async fn list(&self) -> Result<Vec<Stored<CalendarEvent>>> {
        Ok(self.events.list("date", self.list_limit).await?)
    }

    /// Events in a month, by date then time
    pub async fn in_month(&self, year_month: YearMonth) -> Result<Vec<Stored<CalendarEvent>>> {
        let mut events = self.list().await?;
        events.retain(|e| year_month.contains(e.date));
        events.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
        Ok(events)
    }

    /// Events on one date, untimed ones first
    pub async fn on_date(&self, date: NaiveDate) -> Result<Vec<Stored<CalendarEvent>>> {
        let mut events = self.events.filter(&criteria([("date", json!(date))])).await?;
        events.sort_by(|a, b| a.time.cmp(&b.time));
        Ok(events)
    }

    /// Events and birthdays for one date
    pub async fn day(&self, date: NaiveDate) -> Result<CalendarDay> {
        let (events, birthdays) = tokio::try_join!(self.on_date(date), self.members.birthdays_on(date))?;
        Ok(CalendarDay {
            date,
            events,
            birthdays,
        })
    }

    pub async fn create(&self, event: &CalendarEvent) -> Result<Stored<CalendarEvent>> {
        let stored = self.events.create(event).await?;
        tracing::info!(id = %stored.id, date = %stored.date, category = %stored.category, "Event added");
        Ok(stored)
    }

    pub async fn update(&self, id: &str, event: &CalendarEvent) -> Result<Stored<CalendarEvent>> {
        Ok(self.events.update(id, event).await?)
    }

    /// Team leader only
    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        session.require_delete("delete event")?;
        self.events.delete(id).await?;
        Ok(())
    }
}
