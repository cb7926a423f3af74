use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

/// Verified caller identity. Extraction fails with 401 unless the token is
/// valid and its subject is an existing, non-deleted user.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized("Missing Authorization header"))?;

        let token = token_from_header(header)
            .ok_or(AppError::Unauthorized("Missing Authorization header"))?;

        let claims = match state.keys.verify(token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                return Err(AppError::Unauthorized("Invalid or expired token"));
            }
        };

        match state.users.find_by_id(claims.sub).await? {
            Some(user) if user.is_active() => Ok(AuthUser(user.id)),
            Some(_) => {
                warn!(user_id = %claims.sub, "token for soft-deleted user");
                Err(AppError::Unauthorized("Invalid or expired token"))
            }
            None => {
                warn!(user_id = %claims.sub, "token for unknown user");
                Err(AppError::Unauthorized("Invalid or expired token"))
            }
        }
    }
}

// The frontend sends the bare token; `Bearer` is accepted for other clients.
fn token_from_header(value: &str) -> Option<&str> {
    let value = value.trim_start();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim();
    (!token.is_empty()).then_some(token)
}
