//! Share links: create one for an owned story, and the public read side.
//!
//! A share token is an opaque random string. Anyone holding it can read
//! the story and download its exports until `expires_at`, if set.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use storyteller_core::error::CoreError;
use storyteller_core::types::{DbId, Timestamp};
use storyteller_core::validation;
use storyteller_db::models::story::Story;
use storyteller_db::repositories::{SectionRepo, ShareRepo, StoryRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::export::{pdf_response, zip_response};
use crate::handlers::stories::{find_owned_story, StoryResponse};
use crate::middleware::auth::AuthParent;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateShareQuery {
    /// Days until the link stops working, at most
    /// [`validation::MAX_SHARE_DAYS`]. Absent or non-positive means the link
    /// never expires.
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub token: String,
    /// Web UI link that opens the shared story.
    pub share_url: String,
    pub expires_at: Option<Timestamp>,
}

/// Expiry for a requested lifetime in days.
pub fn expires_at_from_days(
    days: Option<i64>,
    now: Timestamp,
) -> Result<Option<Timestamp>, CoreError> {
    let Some(days) = days.filter(|d| *d > 0) else {
        return Ok(None);
    };
    validation::validate_share_days(days)?;
    Duration::try_days(days)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .map(Some)
        .ok_or_else(|| {
            CoreError::Validation(format!("Share expiry of {days} days is out of range"))
        })
}

pub fn share_url(base_url: &str, token: &str) -> String {
    format!("{}/?share={token}", base_url.trim_end_matches('/'))
}

/// Resolve a token to its story, rejecting unknown and expired shares.
async fn shared_story(state: &AppState, token: &str) -> AppResult<Story> {
    let share = ShareRepo::find(&state.pool, token)
        .await?
        .ok_or_else(|| AppError::NotFound("Share not found".into()))?;
    if share.is_expired_at(Utc::now()) {
        return Err(AppError::NotFound("Share expired".into()));
    }

    StoryRepo::find_by_id(&state.pool, share.story_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Story not found".into()))
}

/// POST /api/v1/stories/{id}/share?expires_in_days=
pub async fn create(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
    Query(query): Query<CreateShareQuery>,
) -> AppResult<(StatusCode, Json<DataResponse<ShareResponse>>)> {
    let expires_at = expires_at_from_days(query.expires_in_days, Utc::now())?;
    let story = find_owned_story(&state, auth.parent_id, id).await?;

    let token = uuid::Uuid::new_v4().simple().to_string();
    let share = ShareRepo::create(&state.pool, story.id, &token, expires_at).await?;

    tracing::info!(story_id = story.id, expires_at = ?share.expires_at, "Share link created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ShareResponse {
                share_url: share_url(&state.config.public_base_url, &share.token),
                token: share.token,
                expires_at: share.expires_at,
            },
        }),
    ))
}

/// GET /api/v1/share/{token}
///
/// Public, read-only view of a shared story.
pub async fn get(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<StoryResponse>>> {
    let story = shared_story(&state, &token).await?;
    let sections = SectionRepo::list_for_story(&state.pool, story.id).await?;
    Ok(Json(DataResponse {
        data: StoryResponse::new(story, sections),
    }))
}

/// GET /api/v1/share/{token}/export/zip
pub async fn export_zip(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Response> {
    let story = shared_story(&state, &token).await?;
    zip_response(&state, &story).await
}

/// GET /api/v1/share/{token}/export/pdf
pub async fn export_pdf(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Response> {
    let story = shared_story(&state, &token).await?;
    pdf_response(&state, &story).await
}
