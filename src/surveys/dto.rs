use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{QuestionType, Survey, SurveyQuestion};
use crate::validation::FieldErrors;

pub(crate) const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Request body for survey create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Base64 data URI on input; the stored value becomes a relative path.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub expire_date: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

/// One incoming question. `id` may be a client-side placeholder for new
/// questions; anything that is not an existing question id means "insert".
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub question_type: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl QuestionInput {
    /// Field errors keyed as `questions.<index>.<field>`.
    pub fn validate(&self, index: usize) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if self.question.trim().is_empty() {
            errors.add(
                &format!("questions.{index}.question"),
                "The question field is required.",
            );
        }
        if QuestionType::parse(&self.question_type).is_none() {
            errors.add(
                &format!("questions.{index}.type"),
                "The selected type is invalid.",
            );
        }
        if self.data.is_none() {
            errors.add(
                &format!("questions.{index}.data"),
                "The data field must be present.",
            );
        }
        errors
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    pub description: Option<String>,
    pub data: serde_json::Value,
}

impl From<SurveyQuestion> for QuestionResponse {
    fn from(q: SurveyQuestion) -> Self {
        Self {
            id: q.id,
            question_type: q.question_type,
            question: q.question,
            description: q.description,
            data: q.data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SurveyResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub status: bool,
    pub expire_date: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub questions: Vec<QuestionResponse>,
}

impl SurveyResponse {
    pub fn from_parts(survey: Survey, questions: Vec<SurveyQuestion>, app_url: &str) -> Self {
        let image_url = survey.image.as_deref().map(|p| join_url(app_url, p));
        Self {
            id: survey.id,
            title: survey.title,
            description: survey.description,
            image: survey.image,
            image_url,
            status: survey.status,
            expire_date: survey
                .expire_date
                .and_then(|d| d.format(DATE_FORMAT).ok()),
            created_at: survey.created_at,
            updated_at: survey.updated_at,
            questions: questions.into_iter().map(QuestionResponse::from).collect(),
        }
    }
}

/// List entry; the question set is only loaded for single-survey reads.
#[derive(Debug, Serialize)]
pub struct SurveyListItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub status: bool,
    pub expire_date: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SurveyListItem {
    pub fn from_survey(survey: Survey, app_url: &str) -> Self {
        let image_url = survey.image.as_deref().map(|p| join_url(app_url, p));
        Self {
            id: survey.id,
            title: survey.title,
            description: survey.description,
            image: survey.image,
            image_url,
            status: survey.status,
            expire_date: survey
                .expire_date
                .and_then(|d| d.format(DATE_FORMAT).ok()),
            created_at: survey.created_at,
        }
    }
}

fn join_url(app_url: &str, relative_path: &str) -> String {
    format!("{}/{}", app_url.trim_end_matches('/'), relative_path)
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
}

#[derive(Debug, Serialize)]
pub struct SurveyPage {
    pub data: Vec<SurveyListItem>,
    pub meta: PageMeta,
}
