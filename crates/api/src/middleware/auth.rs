//! Bearer-token extractor for parent-only handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use storyteller_core::error::CoreError;
use storyteller_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated parent, taken from `Authorization: Bearer <jwt>`.
///
/// ```ignore
/// async fn list(State(state): State<AppState>, auth: AuthParent) -> AppResult<Json<()>> {
///     tracing::info!(parent_id = auth.parent_id, "listing");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthParent {
    pub parent_id: DbId,
}

impl FromRequestParts<AppState> for AuthParent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthParent {
            parent_id: claims.sub,
        })
    }
}
