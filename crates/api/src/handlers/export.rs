//! ZIP and PDF downloads for owned and shared stories.

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use storyteller_core::export::pdf::build_pdf;
use storyteller_core::export::zip::build_zip;
use storyteller_core::export::{download_filename, ExportChapter, ExportStory, EXPORT_AUTHOR};
use storyteller_core::types::DbId;
use storyteller_db::models::story::Story;
use storyteller_db::repositories::SectionRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::stories::find_owned_story;
use crate::middleware::auth::AuthParent;
use crate::state::AppState;

/// Bytes of an illustration, from the media store or over HTTP.
///
/// Failures are logged and yield `None`; the export goes on without the
/// image.
async fn load_image(state: &AppState, url: &str) -> Option<Vec<u8>> {
    match state.media.get(url).await {
        Ok(Some(bytes)) => return Some(bytes),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(url, error = %e, "Failed to read stored image");
            return None;
        }
    }

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return None;
    }

    let fetched = async {
        let response = state.http.get(url).send().await?.error_for_status()?;
        response.bytes().await
    }
    .await;
    match fetched {
        Ok(bytes) => Some(bytes.to_vec()),
        Err(e) => {
            tracing::warn!(url, error = %e, "Failed to download image");
            None
        }
    }
}

/// Flatten a story into the export model, loading image bytes.
pub(crate) async fn export_story(state: &AppState, story: &Story) -> AppResult<ExportStory> {
    let sections = SectionRepo::list_for_story(&state.pool, story.id).await?;

    let mut chapters = Vec::with_capacity(sections.len());
    for section in sections {
        let image_bytes = match section.image_url.as_deref() {
            Some(url) => load_image(state, url).await,
            None => None,
        };
        chapters.push(ExportChapter {
            title: section.title,
            text: section.text,
            image_prompt: Some(section.image_prompt).filter(|p| !p.is_empty()),
            image_url: section.image_url,
            audio_url: section.audio_url,
            image_bytes,
        });
    }

    Ok(ExportStory {
        story_id: story.id,
        title: story.title.clone(),
        author: EXPORT_AUTHOR.to_string(),
        age_group: story.age_group.clone(),
        language: story.language.clone(),
        style: story.style.clone(),
        chapters,
    })
}

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// `<title>_story.zip` with `story.json` and the chapter images.
pub(crate) async fn zip_response(state: &AppState, story: &Story) -> AppResult<Response> {
    let export = export_story(state, story).await?;
    let bytes = tokio::task::spawn_blocking(move || build_zip(&export))
        .await
        .map_err(|e| AppError::InternalError(format!("ZIP task failed: {e}")))?
        .map_err(|e| AppError::InternalError(format!("ZIP export failed: {e}")))?;

    tracing::info!(story_id = story.id, bytes = bytes.len(), "ZIP exported");
    Ok(attachment(
        "application/zip",
        &download_filename(&story.title, "_story.zip"),
        bytes,
    ))
}

/// `<title>.pdf`, one page per chapter.
pub(crate) async fn pdf_response(state: &AppState, story: &Story) -> AppResult<Response> {
    let export = export_story(state, story).await?;
    let bytes = tokio::task::spawn_blocking(move || build_pdf(&export))
        .await
        .map_err(|e| AppError::InternalError(format!("PDF task failed: {e}")))?;

    tracing::info!(story_id = story.id, bytes = bytes.len(), "PDF exported");
    Ok(attachment(
        "application/pdf",
        &download_filename(&story.title, ".pdf"),
        bytes,
    ))
}

/// GET /api/v1/stories/{id}/export/zip
pub async fn story_zip(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let story = find_owned_story(&state, auth.parent_id, id).await?;
    zip_response(&state, &story).await
}

/// GET /api/v1/stories/{id}/export/pdf
pub async fn story_pdf(
    State(state): State<AppState>,
    auth: AuthParent,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let story = find_owned_story(&state, auth.parent_id, id).await?;
    pdf_response(&state, &story).await
}
