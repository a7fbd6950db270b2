use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::user::Principal;
use crate::state::AppState;

/// Resolves `Authorization: Bearer <token>` into a principal through the
/// directory's token index. Tokens are issued once, at registration.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthenticated("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::Unauthenticated(
                    "invalid authorization format, expected 'Bearer <token>'".to_string(),
                )
            })?;

        state
            .directory
            .authenticate(token)
            .ok_or_else(|| AppError::Unauthenticated("invalid token".to_string()))
    }
}
