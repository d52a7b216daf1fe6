//! Handlers for the `/stories` resource: generate, list, get, delete.
//!
//! Also home to the story response DTOs and the ownership lookup shared by
//! the per-story sub-resources (images, narration, report, learning,
//! sharing, exports).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use storyteller_core::error::CoreError;
use storyteller_core::safety::check_prompt;
use storyteller_core::story::{
    age_to_group, StoryStatus, DEFAULT_AGE_GROUP, DEFAULT_LANGUAGE, DEFAULT_SECTION_COUNT,
    DEFAULT_STYLE,
};
use storyteller_core::types::{DbId, Timestamp};
use storyteller_core::validation;
use storyteller_db::models::section::{CreateSection, StorySection};
use storyteller_db::models::story::{CreateStory, Story};
use storyteller_db::repositories::{ChildRepo, SectionRepo, StoryRepo};
use storyteller_pipeline::story::{generate_story, ChildPersona, StoryRequest};

use crate::error::{AppError, AppResult};
use crate::handlers::images::illustrate_sections;
use crate::middleware::auth::AuthParent;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /stories`. Unknown fields are rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateStoryRequest {
    pub prompt: String,
    /// Reader age group such as `3-5`. Derived from the child's age when
    /// omitted and a child is given.
    #[serde(default, alias = "age")]
    pub age_group: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub sections: Option<u8>,
    #[serde(default = "default_true")]
    pub generate_images: bool,
    #[serde(default)]
    pub image_size: Option<String>,
    #[serde(default)]
    pub image_style: Option<String>,
    /// Title to use instead of the generated one when non-blank.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub child_id: Option<DbId>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ListStoriesQuery {
    pub child_id: Option<DbId>,
}

/// One section as clients see it; `id` is the 1-based position.
#[derive(Debug, Serialize)]
pub struct SectionResponse {
    pub id: i32,
    pub title: String,
    pub text: String,
    pub image_prompt: String,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
}

impl From<StorySection> for SectionResponse {
    fn from(section: StorySection) -> Self {
        Self {
            id: section.idx,
            title: section.title,
            text: section.text,
            image_prompt: section.image_prompt,
            image_url: section.image_url,
            audio_url: section.audio_url,
        }
    }
}

/// A story with its ordered sections.
#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub story_id: DbId,
    pub title: String,
    pub status: StoryStatus,
    pub child_id: Option<DbId>,
    pub age_group: String,
    pub language: String,
    pub style: String,
    pub created_at: Timestamp,
    pub sections: Vec<SectionResponse>,
}

impl StoryResponse {
    pub fn new(story: Story, sections: Vec<StorySection>) -> Self {
        let status = story.status();
        Self {
            story_id: story.id,
            title: story.title,
            status,
            child_id: story.child_id,
            age_group: story.age_group,
            language: story.language,
            style: story.style,
            created_at: story.created_at,
            sections: sections.into_iter().map(SectionResponse::from).collect(),
        }
    }
}

/// Row of `GET /stories`: metadata and token usage, no section text.
#[derive(Debug, Serialize)]
pub struct StorySummary {
    pub story_id: DbId,
    pub title: String,
    pub status: StoryStatus,
    pub child_id: Option<DbId>,
    pub age_group: String,
    pub language: String,
    pub style: String,
    pub model: Option<String>,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
    pub created_at: Timestamp,
}

impl From<Story> for StorySummary {
    fn from(story: Story) -> Self {
        let status = story.status();
        Self {
            story_id: story.id,
            title: story.title,
            status,
            child_id: story.child_id,
            age_group: story.age_group,
            language: story.language,
            style: story.style,
            model: story.model,
            input_tokens: story.input_tokens,
            output_tokens: story.output_tokens,
            total_tokens: story.total_tokens,
            created_at: story.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a story owned by the caller, or 404.
pub(crate) async fn find_owned_story(
    state: &AppState,
    parent_id: DbId,
    story_id: DbId,
) -> AppResult<Story> {
    StoryRepo::find_for_parent(&state.pool, parent_id, story_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Story",
            id: story_id,
        }))
}

/// Re-read a story and its sections into a response.
pub(crate) async fn load_story_response(state: &AppState, story_id: DbId) -> AppResult<StoryResponse> {
    let story = StoryRepo::find_by_id(&state.pool, story_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Story",
            id: story_id,
        }))?;
    let sections = SectionRepo::list_for_story(&state.pool, story_id).await?;
    Ok(StoryResponse::new(story, sections))
}

/// Trimmed value, or `default` when absent or blank.
fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/stories
///
/// Generate and persist a story, then illustrate every section when
/// `generate_images` is set. Provider failures return 502; if illustration
/// fails the story stays saved and `ready` so images can be retried.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthParent,
    Json(input): Json<CreateStoryRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<StoryResponse>>)> {
    let prompt = input.prompt.trim().to_string();
    validation::validate_story_prompt(&prompt)?;
    check_prompt(&prompt)?;

    let child = match input.child_id {
        Some(child_id) => Some(
            ChildRepo::find_for_parent(&state.pool, auth.parent_id, child_id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "Child",
                    id: child_id,
                }))?,
        ),
        None => None,
    };

    let default_age_group = child
        .as_ref()
        .map_or(DEFAULT_AGE_GROUP, |c| age_to_group(c.age));
    let age_group = or_default(input.age_group, default_age_group);
    let language = or_default(input.language, DEFAULT_LANGUAGE);
    let style = or_default(input.style, DEFAULT_STYLE);
    let sections = input.sections.unwrap_or(DEFAULT_SECTION_COUNT);
    let title = input.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let image_size = or_default(input.image_size, &state.provider_config.image_size);
    let image_style = input.image_style.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    validation::validate_age_group(&age_group)?;
    validation::validate_language(&language)?;
    validation::validate_style(&style)?;
    validation::validate_section_count(sections)?;
    if let Some(title) = &title {
        validation::validate_title(title)?;
    }
    let image_size = validation::normalize_image_size(&image_size)?;
    if let Some(image_style) = &image_style {
        validation::validate_image_style(image_style)?;
    }

    let request = StoryRequest {
        prompt: prompt.clone(),
        age_group: age_group.clone(),
        language: language.clone(),
        style: style.clone(),
        sections,
        title_hint: title.clone(),
        child: child.as_ref().map(|c| ChildPersona {
            name: c.name.clone(),
            age: c.age,
            interests: c.interests.clone(),
        }),
    };

    let generated = generate_story(
        state.provider.as_ref(),
        &state.provider_config.story_model,
        &request,
    )
    .await?;

    let usage = generated.usage;
    let story_input = CreateStory {
        child_id: child.as_ref().map(|c| c.id),
        title: title.unwrap_or(generated.title),
        prompt,
        age_group,
        language,
        style,
        model: Some(usage.model).filter(|m| !m.is_empty()),
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        total_tokens: usage.total_tokens,
    };
    let section_inputs: Vec<CreateSection> = generated
        .sections
        .into_iter()
        .map(|d| CreateSection {
            idx: d.id,
            title: d.title,
            text: d.text,
            image_prompt: d.image_prompt,
        })
        .collect();

    let (story, rows) =
        StoryRepo::create_with_sections(&state.pool, auth.parent_id, &story_input, &section_inputs)
            .await?;

    tracing::info!(
        parent_id = auth.parent_id,
        story_id = story.id,
        sections = rows.len(),
        total_tokens = ?story.total_tokens,
        "Story created"
    );

    if input.generate_images {
        illustrate_sections(
            &state,
            auth.parent_id,
            story.id,
            &rows,
            &image_size,
            image_style.as_deref(),
        )
        .await?;
    }

    let response = load_story_response(&state, story.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// GET /api/v1/stories?child_id=
///
/// Newest first.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthParent,
    Query(query): Query<ListStoriesQuery>,
) -> AppResult<Json<DataResponse<Vec<StorySummary>>>> {
    let stories = StoryRepo::list_for_parent(&state.pool, auth.parent_id, query.child_id).await?;
    Ok(Json(DataResponse {
        data: stories.into_iter().map(StorySummary::from).collect(),
    }))
}

/// GET /api/v1/stories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StoryResponse>>> {
    let story = find_owned_story(&state, auth.parent_id, id).await?;
    let sections = SectionRepo::list_for_story(&state.pool, story.id).await?;
    Ok(Json(DataResponse {
        data: StoryResponse::new(story, sections),
    }))
}

/// DELETE /api/v1/stories/{id}
///
/// Sections, shares, reports, and learning packs go with it.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if StoryRepo::delete(&state.pool, auth.parent_id, id).await? {
        tracing::info!(parent_id = auth.parent_id, story_id = id, "Story deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Story",
            id,
        }))
    }
}
