use axum::{extract::State, routing::post, Json, Router};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, LogoutResponse, PublicUser, RegisterRequest},
        extractors::AuthSession,
        password::{hash_password, verify_password},
        repo::{AccessToken, User},
        token,
    },
    error::ApiError,
    state::AppState,
    validation::{is_valid_email, password_errors, FieldErrors},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_string();

    let mut errors = FieldErrors::default();
    if payload.name.is_empty() {
        errors.add("name", "The name field is required.");
    }
    if !is_valid_email(&payload.email) {
        errors.add("email", "The email must be a valid email address.");
    } else if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        // Ensure email is not taken
        warn!(email = %payload.email, "email already registered");
        errors.add("email", "The email has already been taken.");
    }
    for message in password_errors(&payload.password) {
        errors.add("password", message);
    }
    if payload.password != payload.password_confirmation {
        errors.add("password", "The password confirmation does not match.");
    }
    errors.into_result()?;

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.name, &payload.email, &hash).await?;
    let plain_token = issue_token(&state, user.id, false).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        user: PublicUser::from(user),
        token: plain_token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        return Err(ApiError::invalid(
            "email",
            "The email must be a valid email address.",
        ));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::invalid("email", "The selected email is invalid.")
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let plain_token = issue_token(&state, user.id, payload.remember).await?;

    info!(user_id = %user.id, email = %user.email, remember = payload.remember, "user logged in");
    Ok(Json(AuthResponse {
        user: PublicUser::from(user),
        token: plain_token,
    }))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<LogoutResponse>, ApiError> {
    // Revoke only the token that authenticated this request.
    AccessToken::revoke(&state.db, session.token_id).await?;
    info!(user_id = %session.user_id, token_id = %session.token_id, "token revoked");
    Ok(Json(LogoutResponse { success: true }))
}

/// Store a fresh token for the user and hand back its plaintext.
/// `remember` only stretches the expiry, never the identity.
async fn issue_token(state: &AppState, user_id: Uuid, remember: bool) -> Result<String, ApiError> {
    let ttl_minutes = if remember {
        state.config.token.remember_ttl_minutes
    } else {
        state.config.token.ttl_minutes
    };
    let plain = token::generate_token();
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes);
    AccessToken::create(&state.db, user_id, &token::hash_token(&plain), expires_at).await?;
    Ok(plain)
}
