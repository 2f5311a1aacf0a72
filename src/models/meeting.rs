//! Meeting minutes and team surveys

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{blank_as_none, blank_date_as_none};
use crate::store::Entity;

// ============================================================================
// Meetings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub date: NaiveDate,

    pub title: String,

    /// Member names
    #[serde(default)]
    pub attendees: Vec<String>,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub decisions: Vec<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub file_url: Option<String>,
}

impl Meeting {
    pub fn new(date: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            date,
            title: title.into(),
            attendees: Vec::new(),
            summary: String::new(),
            decisions: Vec::new(),
            file_url: None,
        }
    }
}

impl Entity for Meeting {
    const COLLECTION: &'static str = "meetings";

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("meeting title must not be blank".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Surveys
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SurveyKind {
    #[default]
    Poll,
    Survey,
    /// Yes/no vote
    Vote,
}

impl SurveyKind {
    pub fn korean_label(&self) -> &'static str {
        match self {
            Self::Poll => "투표",
            Self::Survey => "설문",
            Self::Vote => "찬반투표",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    #[default]
    Single,
    Multiple,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyQuestion {
    pub id: String,

    pub question: String,

    #[serde(rename = "type", default)]
    pub kind: QuestionKind,

    #[serde(default)]
    pub options: Vec<String>,
}

impl SurveyQuestion {
    pub fn choice(id: impl Into<String>, question: impl Into<String>, options: &[&str]) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            kind: QuestionKind::Single,
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// One answer: a single option, several options, or free text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SurveyAnswer {
    One(String),
    Many(Vec<String>),
}

impl SurveyAnswer {
    pub fn picks(&self, option: &str) -> bool {
        match self {
            Self::One(answer) => answer == option,
            Self::Many(answers) => answers.iter().any(|a| a == option),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResponse {
    /// Email of the responder; used to stop double answers
    pub user_id: String,

    pub user_name: String,

    /// Keyed by question id
    #[serde(default)]
    pub answers: BTreeMap<String, SurveyAnswer>,

    pub submitted_at: DateTime<Utc>,
}

/// Count of responses picking one option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionTally {
    pub option: String,
    pub count: usize,
    /// Rounded share of all responses, 0 when nobody answered
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type", default)]
    pub kind: SurveyKind,

    #[serde(default)]
    pub questions: Vec<SurveyQuestion>,

    /// Last day to answer
    #[serde(default, deserialize_with = "blank_date_as_none")]
    pub deadline: Option<NaiveDate>,

    #[serde(default)]
    pub is_anonymous: bool,

    #[serde(default)]
    pub responses: Vec<SurveyResponse>,
}

impl Survey {
    pub fn new(title: impl Into<String>, questions: Vec<SurveyQuestion>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            kind: SurveyKind::default(),
            questions,
            deadline: None,
            is_anonymous: false,
            responses: Vec::new(),
        }
    }

    /// Closed once the deadline day has passed
    pub fn is_closed(&self, today: NaiveDate) -> bool {
        self.deadline.map(|d| d < today).unwrap_or(false)
    }

    pub fn has_responded(&self, user_id: &str) -> bool {
        self.responses.iter().any(|r| r.user_id == user_id)
    }

    pub fn question(&self, id: &str) -> Option<&SurveyQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Per-option counts for a choice question, in option order
    pub fn tally(&self, question_id: &str) -> Vec<OptionTally> {
        let Some(question) = self.question(question_id) else {
            return Vec::new();
        };
        let total = self.responses.len();

        question
            .options
            .iter()
            .map(|option| {
                let count = self
                    .responses
                    .iter()
                    .filter(|r| {
                        r.answers
                            .get(question_id)
                            .map(|a| a.picks(option))
                            .unwrap_or(false)
                    })
                    .count();
                let percentage = if total == 0 {
                    0
                } else {
                    ((count as f64 / total as f64) * 100.0).round() as u32
                };
                OptionTally {
                    option: option.clone(),
                    count,
                    percentage,
                }
            })
            .collect()
    }
}

impl Entity for Survey {
    const COLLECTION: &'static str = "surveys";

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("survey title must not be blank".to_string());
        }
        for question in &self.questions {
            if question.question.trim().is_empty() {
                return Err(format!("question {} must not be blank", question.id));
            }
            if question.kind != QuestionKind::Text && question.options.len() < 2 {
                return Err(format!("question {} needs at least two options", question.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(user: &str, answer: SurveyAnswer) -> SurveyResponse {
        SurveyResponse {
            user_id: user.to_string(),
            user_name: user.to_string(),
            answers: BTreeMap::from([("1".to_string(), answer)]),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_tally_counts_single_and_multiple() {
        let mut survey = Survey::new(
            "Retreat",
            vec![SurveyQuestion::choice("1", "Which day?", &["Fri", "Sat", "Sun"])],
        );
        survey
            .responses
            .push(response("a", SurveyAnswer::One("Fri".to_string())));
        survey.responses.push(response(
            "b",
            SurveyAnswer::Many(vec!["Fri".to_string(), "Sat".to_string()]),
        ));
        survey
            .responses
            .push(response("c", SurveyAnswer::One("Sun".to_string())));

        let tally = survey.tally("1");
        assert_eq!(tally[0].count, 2);
        assert_eq!(tally[0].percentage, 67);
        assert_eq!(tally[1].count, 1);
        assert_eq!(tally[1].percentage, 33);
        assert!(survey.tally("missing").is_empty());
    }

    #[test]
    fn test_no_responses_is_zero_percent() {
        let survey = Survey::new("Snack", vec![SurveyQuestion::choice("1", "?", &["A", "B"])]);
        assert!(survey.tally("1").iter().all(|t| t.count == 0 && t.percentage == 0));
    }

    #[test]
    fn test_type_field_and_deadline() {
        let survey: Survey = serde_json::from_value(serde_json::json!({
            "title": "Vote",
            "type": "vote",
            "deadline": "2024-06-10",
            "questions": [{ "id": "1", "question": "Agree?", "type": "single", "options": ["Yes", "No"] }]
        }))
        .unwrap();
        assert_eq!(survey.kind, SurveyKind::Vote);
        assert!(!survey.is_closed(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()));
        assert!(survey.is_closed(NaiveDate::from_ymd_opt(2024, 6, 11).unwrap()));
    }

    #[test]
    fn test_choice_question_needs_options() {
        let survey = Survey::new("Bad", vec![SurveyQuestion::choice("1", "Pick", &["Only"])]);
        assert!(survey.validate().is_err());
    }
}
