//! Illustration handlers: every section, one section, or a standalone image.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use storyteller_core::error::CoreError;
use storyteller_core::story::{fallback_image_prompt, StoryStatus};
use storyteller_core::types::DbId;
use storyteller_core::validation;
use storyteller_db::models::section::StorySection;
use storyteller_db::repositories::SectionRepo;
use storyteller_pipeline::illustration::{generate_illustration, styled_prompt};

use crate::error::{AppError, AppResult};
use crate::handlers::status::StatusGuard;
use crate::handlers::stories::{
    find_owned_story, load_story_response, SectionResponse, StoryResponse,
};
use crate::media::{section_image_key, standalone_image_key};
use crate::middleware::auth::AuthParent;
use crate::response::DataResponse;
use crate::state::AppState;

const PNG_CONTENT_TYPE: &str = "image/png";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of the story and section image endpoints. Both fields are optional;
/// the size defaults to the configured image size.
#[derive(Debug, Default, Deserialize)]
pub struct ImagesRequest {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub image_style: Option<String>,
}

/// Body of `POST /images`.
#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub image_prompt: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub image_style: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub image_url: String,
}

/// Validated size and style.
struct ImageOptions {
    size: String,
    style: Option<String>,
}

fn image_options(
    state: &AppState,
    size: Option<String>,
    style: Option<String>,
) -> AppResult<ImageOptions> {
    let size = size
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| state.provider_config.image_size.clone());
    let size = validation::normalize_image_size(&size)?;

    let style = style.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    if let Some(style) = &style {
        validation::validate_image_style(style)?;
    }
    Ok(ImageOptions { size, style })
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Generate, store, and record one section's illustration.
async fn illustrate_one(
    state: &AppState,
    story_id: DbId,
    section: &StorySection,
    size: &str,
    style: Option<&str>,
) -> AppResult<StorySection> {
    let base = if section.image_prompt.trim().is_empty() {
        fallback_image_prompt(&section.text)
    } else {
        section.image_prompt.clone()
    };
    let prompt = styled_prompt(&base, style);

    let bytes = generate_illustration(
        state.provider.as_ref(),
        &state.provider_config,
        &prompt,
        size,
    )
    .await?;
    let url = state
        .media
        .put(&section_image_key(story_id, section.idx), bytes, PNG_CONTENT_TYPE)
        .await?;

    SectionRepo::set_image_url(&state.pool, story_id, section.idx, &url)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Section {} vanished", section.idx)))
}

/// Illustrate sections one after another.
///
/// The story is `generating-images` for the duration of the loop and is
/// put back to `ready` afterwards, also on failure or cancellation.
pub(crate) async fn illustrate_sections(
    state: &AppState,
    parent_id: DbId,
    story_id: DbId,
    sections: &[StorySection],
    size: &str,
    style: Option<&str>,
) -> AppResult<()> {
    let busy =
        StatusGuard::begin(&state.pool, parent_id, story_id, StoryStatus::GeneratingImages).await?;

    let mut result = Ok(());
    for section in sections {
        if let Err(e) = illustrate_one(state, story_id, section, size, style).await {
            tracing::warn!(story_id, idx = section.idx, "Illustration failed, stopping");
            result = Err(e);
            break;
        }
    }

    busy.finish().await?;
    if result.is_ok() {
        tracing::info!(story_id, sections = sections.len(), "Story illustrated");
    }
    result
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/stories/{id}/images
///
/// Illustrate every section, replacing existing images.
pub async fn generate_for_story(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
    Json(input): Json<ImagesRequest>,
) -> AppResult<Json<DataResponse<StoryResponse>>> {
    let options = image_options(&state, input.size, input.image_style)?;
    let story = find_owned_story(&state, auth.parent_id, id).await?;
    let sections = SectionRepo::list_for_story(&state.pool, story.id).await?;

    illustrate_sections(
        &state,
        auth.parent_id,
        story.id,
        &sections,
        &options.size,
        options.style.as_deref(),
    )
    .await?;

    let response = load_story_response(&state, story.id).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/stories/{id}/sections/{idx}/image
///
/// Illustrate one section. The story status is left alone so a client can
/// drive the loop itself.
pub async fn generate_for_section(
    State(state): State<AppState>,
    auth: AuthParent,
    Path((id, idx)): Path<(DbId, i32)>,
    Json(input): Json<ImagesRequest>,
) -> AppResult<Json<DataResponse<SectionResponse>>> {
    let options = image_options(&state, input.size, input.image_style)?;
    let story = find_owned_story(&state, auth.parent_id, id).await?;
    let section = SectionRepo::find(&state.pool, story.id, idx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Section {idx} not found")))?;

    let updated =
        illustrate_one(&state, story.id, &section, &options.size, options.style.as_deref()).await?;
    Ok(Json(DataResponse {
        data: SectionResponse::from(updated),
    }))
}

/// POST /api/v1/images
///
/// Generate one image from a free-form prompt. Not tied to any story.
pub async fn generate_standalone(
    State(state): State<AppState>,
    _auth: AuthParent,
    Json(input): Json<ImageRequest>,
) -> AppResult<Json<DataResponse<ImageResponse>>> {
    let prompt = input.image_prompt.trim().to_string();
    validation::validate_image_prompt(&prompt)?;
    let options = image_options(&state, input.size, input.image_style)?;

    let bytes = generate_illustration(
        state.provider.as_ref(),
        &state.provider_config,
        &styled_prompt(&prompt, options.style.as_deref()),
        &options.size,
    )
    .await?;
    if bytes.is_empty() {
        return Err(AppError::Core(CoreError::Internal(
            "Image provider returned no data".into(),
        )));
    }

    let image_url = state
        .media
        .put(&standalone_image_key(), bytes, PNG_CONTENT_TYPE)
        .await?;
    Ok(Json(DataResponse {
        data: ImageResponse { image_url },
    }))
}
