//! Learning packs: read, generate, and hand-edit.

use axum::extract::{Path, Query, State};
use axum::Json;
use storyteller_core::learning::LearningPack;
use storyteller_core::types::DbId;
use storyteller_db::repositories::{LearningRepo, SectionRepo};
use storyteller_pipeline::learning::{generate_learning_pack, join_section_texts, LearningRequest};

use crate::error::{AppError, AppResult};
use crate::handlers::report::RefreshQuery;
use crate::handlers::stories::find_owned_story;
use crate::middleware::auth::AuthParent;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/stories/{id}/learning
pub async fn get(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<LearningPack>>> {
    let story = find_owned_story(&state, auth.parent_id, id).await?;
    let row = LearningRepo::find(&state.pool, story.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Learning pack not found".into()))?;
    Ok(Json(DataResponse { data: row.into() }))
}

/// POST /api/v1/stories/{id}/learning?refresh=
///
/// Returns the stored pack unless there is none or `refresh=true`, in which
/// case a new one is generated and stored. Provider failures return 502.
pub async fn generate(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
    Query(query): Query<RefreshQuery>,
) -> AppResult<Json<DataResponse<LearningPack>>> {
    let story = find_owned_story(&state, auth.parent_id, id).await?;

    if !query.refresh {
        if let Some(row) = LearningRepo::find(&state.pool, story.id).await? {
            return Ok(Json(DataResponse { data: row.into() }));
        }
    }

    let sections = SectionRepo::list_for_story(&state.pool, story.id).await?;
    let request = LearningRequest {
        title: story.title.clone(),
        age_group: story.age_group.clone(),
        language: story.language.clone(),
        style: story.style.clone(),
        story_text: join_section_texts(sections.iter().map(|s| s.text.as_str())),
    };

    let pack = generate_learning_pack(
        state.provider.as_ref(),
        &state.provider_config.learning_model,
        &request,
    )
    .await?;
    let row = LearningRepo::upsert(&state.pool, story.id, &pack).await?;

    tracing::info!(story_id = story.id, "Learning pack generated");
    Ok(Json(DataResponse { data: row.into() }))
}

/// PUT /api/v1/stories/{id}/learning
///
/// Replace the pack with a hand-edited one. Fields are trimmed and
/// length-checked.
pub async fn save_manual(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
    Json(input): Json<LearningPack>,
) -> AppResult<Json<DataResponse<LearningPack>>> {
    let story = find_owned_story(&state, auth.parent_id, id).await?;
    let pack = input.validated()?;
    let row = LearningRepo::upsert(&state.pool, story.id, &pack).await?;

    tracing::info!(story_id = story.id, "Learning pack saved manually");
    Ok(Json(DataResponse { data: row.into() }))
}
