//! Safety and readability report.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use storyteller_core::report::{build_story_report, ReportMeta, SectionContent, StoryReport};
use storyteller_core::types::DbId;
use storyteller_db::repositories::{ReportRepo, SectionRepo};

use crate::error::AppResult;
use crate::handlers::stories::find_owned_story;
use crate::middleware::auth::AuthParent;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    /// Recompute even if a stored copy exists.
    #[serde(default)]
    pub refresh: bool,
}

/// GET /api/v1/stories/{id}/report?refresh=
///
/// Returns the stored report, computing and storing it on first request
/// or when `refresh=true`.
pub async fn get(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
    Query(query): Query<RefreshQuery>,
) -> AppResult<Json<DataResponse<StoryReport>>> {
    let story = find_owned_story(&state, auth.parent_id, id).await?;

    if !query.refresh {
        if let Some(row) = ReportRepo::find(&state.pool, story.id).await? {
            return Ok(Json(DataResponse { data: row.report.0 }));
        }
    }

    let sections = SectionRepo::list_for_story(&state.pool, story.id).await?;
    let report = build_story_report(
        &ReportMeta {
            story_id: story.id,
            title: &story.title,
            age_group: &story.age_group,
            language: &story.language,
            style: &story.style,
        },
        sections.iter().map(|s| SectionContent {
            text: &s.text,
            image_prompt: &s.image_prompt,
        }),
    );
    ReportRepo::upsert(&state.pool, story.id, &report).await?;

    tracing::info!(
        story_id = story.id,
        words = report.metrics.word_count,
        flagged = report.flags.blocked_terms_in_story.len(),
        "Story report computed"
    );
    Ok(Json(DataResponse { data: report }))
}
