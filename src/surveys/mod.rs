mod dto;
pub mod handlers;
pub mod reconcile;
pub mod repo;
mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::survey_routes()
}
