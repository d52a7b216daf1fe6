//! Story section model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use storyteller_core::types::{DbId, Timestamp};

/// A row from the `story_sections` table. `idx` is the 1-based position
/// within the story and is what clients address sections by.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StorySection {
    pub id: DbId,
    pub story_id: DbId,
    pub idx: i32,
    pub title: String,
    pub text: String,
    pub image_prompt: String,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a section alongside its story.
#[derive(Debug, Clone)]
pub struct CreateSection {
    pub idx: i32,
    pub title: String,
    pub text: String,
    pub image_prompt: String,
}
