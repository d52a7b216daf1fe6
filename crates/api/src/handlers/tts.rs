//! Narration handler.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use storyteller_core::story::StoryStatus;
use storyteller_core::types::DbId;
use storyteller_core::validation::{validate_audio_format, validate_voice};
use storyteller_db::models::section::StorySection;
use storyteller_db::repositories::SectionRepo;
use storyteller_pipeline::narration::{
    audio_content_type, narrate, DEFAULT_AUDIO_FORMAT, DEFAULT_VOICE,
};

use crate::error::{AppError, AppResult};
use crate::handlers::status::StatusGuard;
use crate::handlers::stories::{find_owned_story, load_story_response, StoryResponse};
use crate::media::section_audio_key;
use crate::middleware::auth::AuthParent;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /stories/{id}/tts`.
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default = "default_voice")]
    pub voice: String,
    /// One of `mp3`, `wav`, `aac`, `flac`, `opus`.
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_format() -> String {
    DEFAULT_AUDIO_FORMAT.to_string()
}

async fn narrate_section(
    state: &AppState,
    story_id: DbId,
    section: &StorySection,
    input: &TtsRequest,
) -> AppResult<()> {
    let audio = narrate(
        state.provider.as_ref(),
        &state.provider_config.tts_model,
        &input.voice,
        &section.text,
        &input.format,
    )
    .await?;
    let url = state
        .media
        .put(
            &section_audio_key(story_id, section.idx, &input.format),
            audio,
            audio_content_type(&input.format),
        )
        .await?;

    SectionRepo::set_audio_url(&state.pool, story_id, section.idx, &url)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Section {} vanished", section.idx)))?;
    Ok(())
}

/// POST /api/v1/stories/{id}/tts
///
/// Narrate every section in order. The story is `generating-audio` while
/// this runs and `ready` afterwards, also on failure or cancellation.
pub async fn generate(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
    Json(input): Json<TtsRequest>,
) -> AppResult<Json<DataResponse<StoryResponse>>> {
    let input = TtsRequest {
        voice: input.voice.trim().to_string(),
        format: input.format.trim().to_lowercase(),
    };
    validate_voice(&input.voice)?;
    validate_audio_format(&input.format)?;

    let story = find_owned_story(&state, auth.parent_id, id).await?;
    let sections = SectionRepo::list_for_story(&state.pool, story.id).await?;

    let busy = StatusGuard::begin(
        &state.pool,
        auth.parent_id,
        story.id,
        StoryStatus::GeneratingAudio,
    )
    .await?;
    let mut result = Ok(());
    for section in &sections {
        if let Err(e) = narrate_section(&state, story.id, section, &input).await {
            tracing::warn!(story_id = story.id, idx = section.idx, "Narration failed, stopping");
            result = Err(e);
            break;
        }
    }
    busy.finish().await?;
    result?;

    tracing::info!(
        story_id = story.id,
        sections = sections.len(),
        voice = %input.voice,
        format = %input.format,
        "Story narrated"
    );

    let response = load_story_response(&state, story.id).await?;
    Ok(Json(DataResponse { data: response }))
}
