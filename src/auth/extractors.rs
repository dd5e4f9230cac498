use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;
use uuid::Uuid;

use crate::auth::{repo::AccessToken, token::hash_token};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated requester: the user identity plus the token row that
/// authenticated this request, so logout can revoke exactly that token.
#[derive(Debug, Clone, Copy)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub token_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthenticated("missing Authorization header"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthenticated("invalid auth scheme"))?;

        let row = AccessToken::find_valid(&state.db, &hash_token(token))
            .await?
            .ok_or_else(|| {
                warn!("invalid or expired token");
                ApiError::Unauthenticated("invalid or expired token")
            })?;

        Ok(AuthSession {
            user_id: row.user_id,
            token_id: row.id,
        })
    }
}
