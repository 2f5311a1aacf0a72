//! Meeting minutes

use crate::error::Result;
use crate::models::Meeting;
use crate::session::Session;
use crate::store::{Collection, SharedDocumentStore, Stored, DEFAULT_LIST_LIMIT};

pub struct MeetingMinutes {
    meetings: Collection<Meeting>,
    list_limit: usize,
}

impl MeetingMinutes {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            meetings: Collection::new(store),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// Most recent meeting first
    pub async fn list(&self) -> Result<Vec<Stored<Meeting>>> {
        Ok(self.meetings.list("-date", self.list_limit).await?)
    }

    pub async fn create(&self, meeting: &Meeting) -> Result<Stored<Meeting>> {
        let stored = self.meetings.create(meeting).await?;
        tracing::info!(id = %stored.id, date = %stored.date, "Meeting recorded");
        Ok(stored)
    }

    pub async fn update(&self, id: &str, meeting: &Meeting) -> Result<Stored<Meeting>> {
        Ok(self.meetings.update(id, meeting).await?)
    }

    /// Team leader only
    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        session.require_delete("delete meeting")?;
        self.meetings.delete(id).await?;
        Ok(())
    }
}
