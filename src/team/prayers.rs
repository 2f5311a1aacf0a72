//! Prayer requests

use chrono::Utc;
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::board::toggle_email;
use crate::models::{PrayerComment, PrayerRequest, ReactionKind};
use crate::session::{Session, SessionError};
use crate::store::{criteria, Collection, SharedDocumentStore, Stored, StoreError, DEFAULT_LIST_LIMIT};

/// Author shown when the poster has no name
pub const ANONYMOUS_AUTHOR: &str = "익명";

pub struct PrayerWall {
    prayers: Collection<PrayerRequest>,
    list_limit: usize,
}

impl PrayerWall {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            prayers: Collection::new(store),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<Stored<PrayerRequest>>> {
        Ok(self.prayers.list("-created_date", self.list_limit).await?)
    }

    /// (active, answered)
    pub async fn split(&self) -> Result<(Vec<Stored<PrayerRequest>>, Vec<Stored<PrayerRequest>>)> {
        Ok(self.list().await?.into_iter().partition(|p| !p.is_answered))
    }

    async fn fetch(&self, id: &str) -> Result<Stored<PrayerRequest>> {
        Ok(self
            .prayers
            .get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(self.prayers.name(), id))?)
    }

    /// The session's display name; blank names post as 익명
    fn author_of(session: &Session) -> String {
        if session.author_name().trim().is_empty() {
            ANONYMOUS_AUTHOR.to_string()
        } else {
            session.author_name().to_string()
        }
    }

    /// Post with fresh prayer, reaction and comment lists
    pub async fn post(&self, session: &Session, mut request: PrayerRequest) -> Result<Stored<PrayerRequest>> {
        request.author_name = Self::author_of(session);
        request.created_by = Some(session.email().to_string());
        request.prayers.clear();
        request.reactions = Default::default();
        request.comments.clear();
        request.is_answered = false;
        request.answer_testimony = None;

        let stored = self.prayers.create(&request).await?;
        tracing::info!(id = %stored.id, urgent = stored.is_urgent, "Prayer request posted");
        Ok(stored)
    }

    /// Add or remove the session user from the praying list
    pub async fn toggle_praying(&self, session: &Session, id: &str) -> Result<Stored<PrayerRequest>> {
        let mut prayers = self.fetch(id).await?.value.prayers;
        toggle_email(&mut prayers, session.email());
        Ok(self
            .prayers
            .patch(id, criteria([("prayers", json!(prayers))]))
            .await?)
    }

    pub async fn toggle_reaction(
        &self,
        session: &Session,
        id: &str,
        kind: ReactionKind,
    ) -> Result<Stored<PrayerRequest>> {
        let mut reactions = self.fetch(id).await?.value.reactions;
        toggle_email(reactions.get_mut(kind), session.email());
        Ok(self
            .prayers
            .patch(id, criteria([("reactions", json!(reactions))]))
            .await?)
    }

    pub async fn add_comment(
        &self,
        session: &Session,
        id: &str,
        content: &str,
    ) -> Result<Stored<PrayerRequest>> {
        if content.trim().is_empty() {
            return Err(Error::validation("comment must not be blank"));
        }

        let mut comments = self.fetch(id).await?.value.comments;
        comments.push(PrayerComment {
            id: uuid::Uuid::new_v4().to_string(),
            author: Self::author_of(session),
            content: content.to_string(),
            created_at: Utc::now(),
        });
        Ok(self
            .prayers
            .patch(id, criteria([("comments", json!(comments))]))
            .await?)
    }

    /// Only the member who posted the request may mark it answered
    pub async fn mark_answered(
        &self,
        session: &Session,
        id: &str,
        testimony: &str,
    ) -> Result<Stored<PrayerRequest>> {
        let current = self.fetch(id).await?;
        if current.created_by.as_deref() != Some(session.email()) {
            return Err(SessionError::PermissionDenied {
                action: "mark prayer answered".to_string(),
            }
            .into());
        }
        if testimony.trim().is_empty() {
            return Err(Error::validation("testimony must not be blank"));
        }

        let stored = self
            .prayers
            .patch(
                id,
                criteria([
                    ("is_answered", json!(true)),
                    ("answer_testimony", json!(testimony)),
                ]),
            )
            .await?;
        tracing::info!(id, "Prayer marked answered");
        Ok(stored)
    }

    /// Team leader only
    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        session.require_delete("delete prayer request")?;
        self.prayers.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Member, PrayerCategory};
    use crate::session::FALLBACK_NAME;
    use crate::store::create_memory_store;
    use chrono::NaiveDate;

    fn member_session(name: &str, email: &str) -> Session {
        let member = Stored {
            id: format!("id-{name}"),
            version: 1,
            created_date: None,
            updated_date: None,
            value: Member::new(name).with_email(email),
        };
        Session::sign_in(&member, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap())
    }

    #[tokio::test]
    async fn test_post_resets_lists() {
        let wall = PrayerWall::new(create_memory_store());
        let mut request = PrayerRequest::new("Family health", PrayerCategory::Family);
        request.prayers.push("someone@example.com".to_string());

        let anon = wall.post(&Session::anonymous(), request).await.unwrap();
        assert_eq!(anon.author_name, FALLBACK_NAME);
        assert!(anon.prayers.is_empty());
        assert_eq!(anon.created_by.as_deref(), Some("user@hiel.church"));
    }

    #[tokio::test]
    async fn test_toggles() {
        let wall = PrayerWall::new(create_memory_store());
        let kim = member_session("Kim", "kim@example.com");
        let posted = wall
            .post(&kim, PrayerRequest::new("Exams", PrayerCategory::Personal))
            .await
            .unwrap();

        let on = wall.toggle_praying(&kim, &posted.id).await.unwrap();
        assert_eq!(on.prayers, vec!["kim@example.com".to_string()]);
        let off = wall.toggle_praying(&kim, &posted.id).await.unwrap();
        assert!(off.prayers.is_empty());

        let reacted = wall
            .toggle_reaction(&kim, &posted.id, ReactionKind::Heart)
            .await
            .unwrap();
        assert_eq!(reacted.reactions.get(ReactionKind::Heart).len(), 1);
        assert!(reacted.reactions.get(ReactionKind::Pray).is_empty());
    }

    #[tokio::test]
    async fn test_comments_append() {
        let wall = PrayerWall::new(create_memory_store());
        let kim = member_session("Kim", "kim@example.com");
        let posted = wall
            .post(&kim, PrayerRequest::new("Exams", PrayerCategory::Personal))
            .await
            .unwrap();

        wall.add_comment(&kim, &posted.id, "praying!").await.unwrap();
        let updated = wall
            .add_comment(&Session::anonymous(), &posted.id, "me too")
            .await
            .unwrap();
        assert_eq!(updated.comments.len(), 2);
        assert_eq!(updated.comments[1].author, FALLBACK_NAME);
        assert!(wall.add_comment(&kim, &posted.id, "  ").await.is_err());
    }

    #[tokio::test]
    async fn test_only_author_marks_answered() {
        let wall = PrayerWall::new(create_memory_store());
        let kim = member_session("Kim", "kim@example.com");
        let lee = member_session("Lee", "lee@example.com");
        let posted = wall
            .post(&kim, PrayerRequest::new("Job", PrayerCategory::Personal))
            .await
            .unwrap();

        assert!(wall.mark_answered(&lee, &posted.id, "thanks").await.is_err());
        let answered = wall
            .mark_answered(&kim, &posted.id, "Got the job")
            .await
            .unwrap();
        assert!(answered.is_answered);
        assert_eq!(answered.answer_testimony.as_deref(), Some("Got the job"));

        let (active, done) = wall.split().await.unwrap();
        assert!(active.is_empty());
        assert_eq!(done.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_display_name_posts_as_anonymous() {
        let wall = PrayerWall::new(create_memory_store());
        let blank = member_session("  ", "blank@example.com");
        let posted = wall
            .post(&blank, PrayerRequest::new("Travel", PrayerCategory::Personal))
            .await
            .unwrap();
        assert_eq!(posted.author_name, ANONYMOUS_AUTHOR);

        let commented = wall.add_comment(&blank, &posted.id, "amen").await.unwrap();
        assert_eq!(commented.comments[0].author, ANONYMOUS_AUTHOR);
    }
}
