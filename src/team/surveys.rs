//! Team surveys and polls
//!
//! Responses are appended to the survey record itself. Each append is a
//! version-checked write, retried a few times when another response landed
//! first, so concurrent answers are never lost.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::models::{OptionTally, Survey, SurveyAnswer, SurveyResponse};
use crate::session::Session;
use crate::store::{Collection, SharedDocumentStore, StoreError, Stored, DEFAULT_LIST_LIMIT};

use super::prayers::ANONYMOUS_AUTHOR;

/// Attempts at appending a response before giving up on conflicts
const RESPONSE_ATTEMPTS: usize = 3;

pub struct SurveyBoard {
    surveys: Collection<Survey>,
    list_limit: usize,
}

impl SurveyBoard {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            surveys: Collection::new(store),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<Stored<Survey>>> {
        Ok(self.surveys.list("-created_date", self.list_limit).await?)
    }

    async fn fetch(&self, id: &str) -> Result<Stored<Survey>> {
        Ok(self
            .surveys
            .get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(self.surveys.name(), id))?)
    }

    /// Create with an empty response list
    pub async fn create(&self, mut survey: Survey) -> Result<Stored<Survey>> {
        survey.responses.clear();
        let stored = self.surveys.create(&survey).await?;
        tracing::info!(id = %stored.id, kind = ?stored.kind, "Survey created");
        Ok(stored)
    }

    /// Record the session user's answers
    ///
    /// Fails once the deadline has passed, when the user already answered,
    /// or when an answer names a question the survey does not have.
    pub async fn respond(
        &self,
        session: &Session,
        id: &str,
        answers: BTreeMap<String, SurveyAnswer>,
        today: NaiveDate,
    ) -> Result<Stored<Survey>> {
        for _ in 0..RESPONSE_ATTEMPTS {
            let current = self.fetch(id).await?;
            if current.is_closed(today) {
                return Err(Error::validation(format!("survey '{}' is closed", current.title)));
            }
            if current.has_responded(session.email()) {
                return Err(Error::validation("already responded to this survey"));
            }
            if let Some(unknown) = answers.keys().find(|q| current.question(q).is_none()) {
                return Err(Error::validation(format!("unknown question '{unknown}'")));
            }

            let user_name = if current.is_anonymous || session.author_name().trim().is_empty() {
                ANONYMOUS_AUTHOR.to_string()
            } else {
                session.author_name().to_string()
            };

            let mut survey = current.value.clone();
            survey.responses.push(SurveyResponse {
                user_id: session.email().to_string(),
                user_name,
                answers: answers.clone(),
                submitted_at: Utc::now(),
            });

            match self
                .surveys
                .update_if_version(id, current.version, &survey)
                .await
            {
                Ok(stored) => {
                    tracing::info!(id, responses = stored.responses.len(), "Survey response recorded");
                    return Ok(stored);
                }
                Err(StoreError::VersionConflict { .. }) => {
                    tracing::debug!(id, "Survey changed while responding, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::other(format!("survey '{id}' kept changing, response not recorded")))
    }

    /// Per-option counts for one question
    pub async fn tally(&self, id: &str, question_id: &str) -> Result<Vec<OptionTally>> {
        let survey = self.fetch(id).await?;
        if survey.question(question_id).is_none() {
            return Err(Error::validation(format!("unknown question '{question_id}'")));
        }
        Ok(survey.tally(question_id))
    }

    /// Team leader only
    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        session.require_delete("delete survey")?;
        self.surveys.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Member, SurveyQuestion};
    use crate::store::create_memory_store;

    fn member_session(name: &str, email: &str) -> Session {
        let member = Stored {
            id: format!("id-{name}"),
            version: 1,
            created_date: None,
            updated_date: None,
            value: Member::new(name).with_email(email),
        };
        Session::sign_in(&member, day(1))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn pick(option: &str) -> BTreeMap<String, SurveyAnswer> {
        BTreeMap::from([("1".to_string(), SurveyAnswer::One(option.to_string()))])
    }

    async fn retreat(board: &SurveyBoard) -> Stored<Survey> {
        let mut survey = Survey::new(
            "Retreat",
            vec![SurveyQuestion::choice("1", "Which day?", &["Fri", "Sat"])],
        );
        survey.deadline = Some(day(10));
        board.create(survey).await.unwrap()
    }

    #[tokio::test]
    async fn test_responses_tallied() {
        let board = SurveyBoard::new(create_memory_store());
        let survey = retreat(&board).await;

        let kim = member_session("Kim", "kim@example.com");
        let lee = member_session("Lee", "lee@example.com");
        board.respond(&kim, &survey.id, pick("Fri"), day(5)).await.unwrap();
        let updated = board.respond(&lee, &survey.id, pick("Fri"), day(5)).await.unwrap();
        assert_eq!(updated.responses[1].user_name, "Lee");

        let tally = board.tally(&survey.id, "1").await.unwrap();
        assert_eq!((tally[0].count, tally[0].percentage), (2, 100));
        assert_eq!((tally[1].count, tally[1].percentage), (0, 0));
    }

    #[tokio::test]
    async fn test_second_response_and_late_response_rejected() {
        let board = SurveyBoard::new(create_memory_store());
        let survey = retreat(&board).await;
        let kim = member_session("Kim", "kim@example.com");

        board.respond(&kim, &survey.id, pick("Sat"), day(10)).await.unwrap();
        assert!(board.respond(&kim, &survey.id, pick("Fri"), day(10)).await.is_err());

        let lee = member_session("Lee", "lee@example.com");
        let late = board.respond(&lee, &survey.id, pick("Fri"), day(11)).await;
        assert!(matches!(late, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_anonymous_survey_hides_names() {
        let board = SurveyBoard::new(create_memory_store());
        let mut survey = Survey::new("Feedback", vec![SurveyQuestion::choice("1", "Good?", &["Yes", "No"])]);
        survey.is_anonymous = true;
        let survey = board.create(survey).await.unwrap();

        let updated = board
            .respond(&member_session("Kim", "kim@example.com"), &survey.id, pick("Yes"), day(1))
            .await
            .unwrap();
        assert_eq!(updated.responses[0].user_name, ANONYMOUS_AUTHOR);
    }

    #[tokio::test]
    async fn test_unknown_question_rejected() {
        let board = SurveyBoard::new(create_memory_store());
        let survey = retreat(&board).await;
        let answers = BTreeMap::from([("9".to_string(), SurveyAnswer::One("Fri".to_string()))]);
        let result = board
            .respond(&Session::anonymous(), &survey.id, answers, day(1))
            .await;
        assert!(result.is_err());
        assert!(board.tally(&survey.id, "9").await.is_err());
    }
}
