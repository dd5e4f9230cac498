use time::Date;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    PageMeta, QuestionInput, SurveyListItem, SurveyPage, SurveyPayload, SurveyResponse,
    DATE_FORMAT,
};
use super::reconcile::{reconcile, ReconcilePlan};
use super::repo::{self, QuestionType, Survey};
use crate::error::ApiError;
use crate::images;
use crate::state::AppState;
use crate::validation::FieldErrors;

pub const PAGE_SIZE: i64 = 6;

pub async fn list(state: &AppState, user_id: Uuid, page: i64) -> Result<SurveyPage, ApiError> {
    let page = page.max(1);
    let total = repo::count_by_user(&state.db, user_id).await?;
    let surveys =
        repo::list_by_user(&state.db, user_id, PAGE_SIZE, (page - 1) * PAGE_SIZE).await?;

    let last_page = ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
    Ok(SurveyPage {
        data: surveys
            .into_iter()
            .map(|s| SurveyListItem::from_survey(s, &state.config.app_url))
            .collect(),
        meta: PageMeta {
            current_page: page,
            per_page: PAGE_SIZE,
            total,
            last_page,
        },
    })
}

pub async fn get(
    state: &AppState,
    user_id: Uuid,
    survey_id: Uuid,
) -> Result<SurveyResponse, ApiError> {
    let survey = owned_survey(state, survey_id, user_id).await?;
    let questions = repo::questions_by_survey(&state.db, survey.id).await?;
    Ok(SurveyResponse::from_parts(
        survey,
        questions,
        &state.config.app_url,
    ))
}

#[instrument(skip(state, payload))]
pub async fn create(
    state: &AppState,
    user_id: Uuid,
    payload: SurveyPayload,
) -> Result<SurveyResponse, ApiError> {
    let expire_date = validate_payload(&payload)?;

    // The image file is written before the transaction opens; if the
    // commit fails it is removed again.
    let image_path = match data_uri(&payload) {
        Some(uri) => {
            Some(images::ingest(state.storage.as_ref(), &state.config.images_dir, uri).await?)
        }
        None => None,
    };

    match insert_all(state, user_id, &payload, image_path.as_deref(), expire_date).await {
        Ok(response) => {
            info!(survey_id = %response.id, %user_id, "survey created");
            Ok(response)
        }
        Err(e) => {
            if let Some(path) = image_path.as_deref() {
                discard_file(state, path).await;
            }
            Err(e)
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn update(
    state: &AppState,
    user_id: Uuid,
    survey_id: Uuid,
    payload: SurveyPayload,
) -> Result<SurveyResponse, ApiError> {
    let survey = owned_survey(state, survey_id, user_id).await?;
    let expire_date = validate_payload(&payload)?;

    // Image policy: a newly supplied image replaces the stored one, a
    // retained one is kept as-is. The new file is written up front; the
    // old file is only removed once the commit has succeeded.
    let mut written: Option<String> = None;
    let mut stale: Option<String> = None;
    let image_path = match data_uri(&payload) {
        Some(uri) => {
            let path =
                images::ingest(state.storage.as_ref(), &state.config.images_dir, uri).await?;
            stale = survey.image.clone();
            written = Some(path.clone());
            Some(path)
        }
        None => survey.image.clone(),
    };

    let existing = repo::questions_by_survey(&state.db, survey.id).await?;
    let plan = reconcile(existing, payload.questions.clone());

    match apply_update(state, &survey, &payload, image_path.as_deref(), expire_date, plan).await {
        Ok(response) => {
            if let Some(path) = stale.as_deref() {
                discard_file(state, path).await;
            }
            info!(survey_id = %survey.id, %user_id, "survey updated");
            Ok(response)
        }
        Err(e) => {
            if let Some(path) = written.as_deref() {
                discard_file(state, path).await;
            }
            Err(e)
        }
    }
}

#[instrument(skip(state))]
pub async fn delete(state: &AppState, user_id: Uuid, survey_id: Uuid) -> Result<(), ApiError> {
    let survey = owned_survey(state, survey_id, user_id).await?;

    let mut tx = state.db.begin().await?;
    repo::delete_tx(&mut tx, survey.id).await?;
    tx.commit().await?;

    // Best-effort: the record is gone either way.
    if let Some(path) = survey.image.as_deref() {
        discard_file(state, path).await;
    }
    info!(survey_id = %survey.id, %user_id, "survey deleted");
    Ok(())
}

/// Resolve a survey and enforce that the requester owns it. The check is
/// uniform across get, update and delete.
async fn owned_survey(
    state: &AppState,
    survey_id: Uuid,
    requester: Uuid,
) -> Result<Survey, ApiError> {
    let survey = repo::find_by_id(&state.db, survey_id)
        .await?
        .ok_or(ApiError::NotFound("Survey"))?;
    if survey.user_id != requester {
        warn!(survey_id = %survey.id, %requester, "ownership check failed");
        return Err(ApiError::Forbidden);
    }
    Ok(survey)
}

async fn insert_all(
    state: &AppState,
    user_id: Uuid,
    payload: &SurveyPayload,
    image: Option<&str>,
    expire_date: Option<Date>,
) -> Result<SurveyResponse, ApiError> {
    let mut tx = state.db.begin().await?;
    // The survey id must exist before its questions.
    let survey = repo::insert_tx(
        &mut tx,
        user_id,
        payload.title.trim(),
        payload.description.as_deref(),
        image,
        payload.status,
        expire_date,
    )
    .await?;

    let mut questions = Vec::with_capacity(payload.questions.len());
    for (index, input) in payload.questions.iter().enumerate() {
        let (question_type, question, description, data) = question_fields(input, index)?;
        questions.push(
            repo::insert_question_tx(
                &mut tx,
                survey.id,
                question_type,
                question,
                description,
                &data,
                index as i32,
            )
            .await?,
        );
    }
    tx.commit().await?;

    Ok(SurveyResponse::from_parts(
        survey,
        questions,
        &state.config.app_url,
    ))
}

async fn apply_update(
    state: &AppState,
    survey: &Survey,
    payload: &SurveyPayload,
    image: Option<&str>,
    expire_date: Option<Date>,
    plan: ReconcilePlan,
) -> Result<SurveyResponse, ApiError> {
    let mut tx = state.db.begin().await?;
    let updated = repo::update_tx(
        &mut tx,
        survey.id,
        payload.title.trim(),
        payload.description.as_deref(),
        image,
        payload.status,
        expire_date,
    )
    .await?;

    if !plan.to_delete.is_empty() {
        repo::delete_questions_tx(&mut tx, &plan.to_delete).await?;
    }
    for (index, current, input) in &plan.to_update {
        let (question_type, question, description, data) = question_fields(input, *index)?;
        repo::update_question_tx(
            &mut tx,
            current.id,
            question_type,
            question,
            description,
            &data,
            *index as i32,
        )
        .await?;
    }
    for (index, input) in &plan.to_insert {
        let (question_type, question, description, data) = question_fields(input, *index)?;
        repo::insert_question_tx(
            &mut tx,
            survey.id,
            question_type,
            question,
            description,
            &data,
            *index as i32,
        )
        .await?;
    }
    tx.commit().await?;

    let questions = repo::questions_by_survey(&state.db, survey.id).await?;
    Ok(SurveyResponse::from_parts(
        updated,
        questions,
        &state.config.app_url,
    ))
}

/// File removal is best-effort; a failure is logged and never fatal.
async fn discard_file(state: &AppState, path: &str) {
    if let Err(e) = state.storage.delete(path).await {
        warn!(error = %e, path, "failed to remove image file");
    }
}

/// Validate everything before any mutation. A failure on any question
/// aborts the whole operation.
fn validate_payload(payload: &SurveyPayload) -> Result<Option<Date>, ApiError> {
    let mut errors = FieldErrors::default();
    if payload.title.trim().is_empty() {
        errors.add("title", "The title field is required.");
    }
    let expire_date = match payload.expire_date.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match Date::parse(raw, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add("expire_date", "The expire date is not a valid date.");
                None
            }
        },
        None => None,
    };
    for (index, question) in payload.questions.iter().enumerate() {
        errors.merge(question.validate(index));
    }
    errors.into_result()?;
    Ok(expire_date)
}

fn data_uri(payload: &SurveyPayload) -> Option<&str> {
    payload.image.as_deref().filter(|s| !s.is_empty())
}

fn question_fields<'a>(
    input: &'a QuestionInput,
    index: usize,
) -> Result<(QuestionType, &'a str, Option<&'a str>, serde_json::Value), ApiError> {
    let question_type = QuestionType::parse(&input.question_type).ok_or_else(|| {
        ApiError::invalid(
            &format!("questions.{index}.type"),
            "The selected type is invalid.",
        )
    })?;
    let data = input.data.clone().ok_or_else(|| {
        ApiError::invalid(
            &format!("questions.{index}.data"),
            "The data field must be present.",
        )
    })?;
    Ok((
        question_type,
        input.question.trim(),
        input.description.as_deref(),
        data,
    ))
}
