use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{Pagination, SurveyPage, SurveyPayload, SurveyResponse};
use super::services;
use crate::{auth::extractors::AuthSession, error::ApiError, state::AppState};

pub fn survey_routes() -> Router<AppState> {
    Router::new()
        .route("/surveys", get(list_surveys).post(create_survey))
        .route(
            "/surveys/:id",
            get(get_survey).put(update_survey).delete(delete_survey),
        )
}

#[instrument(skip(state))]
pub async fn list_surveys(
    State(state): State<AppState>,
    session: AuthSession,
    Query(pagination): Query<Pagination>,
) -> Result<Json<SurveyPage>, ApiError> {
    let page = services::list(&state, session.user_id, pagination.page).await?;
    Ok(Json(page))
}

#[instrument(skip(state, payload))]
pub async fn create_survey(
    State(state): State<AppState>,
    session: AuthSession,
    Json(payload): Json<SurveyPayload>,
) -> Result<(StatusCode, Json<SurveyResponse>), ApiError> {
    let survey = services::create(&state, session.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(survey)))
}

#[instrument(skip(state))]
pub async fn get_survey(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<SurveyResponse>, ApiError> {
    let survey = services::get(&state, session.user_id, id).await?;
    Ok(Json(survey))
}

#[instrument(skip(state, payload))]
pub async fn update_survey(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<SurveyPayload>,
) -> Result<Json<SurveyResponse>, ApiError> {
    let survey = services::update(&state, session.user_id, id, payload).await?;
    Ok(Json(survey))
}

#[instrument(skip(state))]
pub async fn delete_survey(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    services::delete(&state, session.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
