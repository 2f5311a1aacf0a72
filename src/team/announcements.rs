//! Announcement board

use serde_json::json;

use crate::error::{Error, Result};
use crate::models::{Announcement, AnnouncementCategory};
use crate::session::Session;
use crate::store::{criteria, Collection, SharedDocumentStore, Stored, StoreError, DEFAULT_LIST_LIMIT};

/// Author shown when the poster's name is blank
pub const DEFAULT_AUTHOR: &str = "관리자";

/// Filtered announcements split for display
#[derive(Debug, Clone, Default)]
pub struct AnnouncementFeed {
    pub pinned: Vec<Stored<Announcement>>,
    pub regular: Vec<Stored<Announcement>>,
}

pub struct AnnouncementBoard {
    announcements: Collection<Announcement>,
    list_limit: usize,
}

impl AnnouncementBoard {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            announcements: Collection::new(store),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<Stored<Announcement>>> {
        Ok(self
            .announcements
            .list("-created_date", self.list_limit)
            .await?)
    }

    /// Search title/content and filter by category, then split pinned posts out
    pub async fn feed(
        &self,
        query: Option<&str>,
        category: Option<AnnouncementCategory>,
    ) -> Result<AnnouncementFeed> {
        let (pinned, regular): (Vec<_>, Vec<_>) = self
            .list()
            .await?
            .into_iter()
            .filter(|a| query.map(|q| a.matches_query(q)).unwrap_or(true))
            .filter(|a| category.map(|c| a.category == c).unwrap_or(true))
            .partition(|a| a.is_pinned);
        Ok(AnnouncementFeed { pinned, regular })
    }

    /// Post as the session user, with an empty read list
    pub async fn post(
        &self,
        session: &Session,
        mut announcement: Announcement,
    ) -> Result<Stored<Announcement>> {
        announcement.author_name = if session.author_name().trim().is_empty() {
            DEFAULT_AUTHOR.to_string()
        } else {
            session.author_name().to_string()
        };
        announcement.read_by.clear();

        let stored = self.announcements.create(&announcement).await?;
        tracing::info!(id = %stored.id, category = %stored.category, "Announcement posted");
        Ok(stored)
    }

    /// Edit content; author and read list are kept
    pub async fn edit(
        &self,
        id: &str,
        title: &str,
        content: &str,
        category: AnnouncementCategory,
        is_pinned: bool,
    ) -> Result<Stored<Announcement>> {
        if title.trim().is_empty() {
            return Err(Error::validation("announcement title must not be blank"));
        }
        Ok(self
            .announcements
            .patch(
                id,
                criteria([
                    ("title", json!(title)),
                    ("content", json!(content)),
                    ("category", json!(category)),
                    ("is_pinned", json!(is_pinned)),
                ]),
            )
            .await?)
    }

    /// Record that the session user opened the post; a second call is a no-op
    pub async fn mark_read(&self, session: &Session, id: &str) -> Result<Stored<Announcement>> {
        let current = self
            .announcements
            .get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(self.announcements.name(), id))?;

        let email = session.email();
        if current.read_by.iter().any(|e| e == email) {
            return Ok(current);
        }

        let mut read_by = current.value.read_by.clone();
        read_by.push(email.to_string());
        Ok(self
            .announcements
            .patch(id, criteria([("read_by", json!(read_by))]))
            .await?)
    }

    /// Team leader only
    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        session.require_delete("delete announcement")?;
        self.announcements.delete(id).await?;
        tracing::info!(id, "Announcement deleted");
        Ok(())
    }
}
