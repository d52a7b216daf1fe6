//! Story model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use storyteller_core::story::StoryStatus;
use storyteller_core::types::{DbId, Timestamp};

/// A row from the `stories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Story {
    pub id: DbId,
    pub parent_id: DbId,
    pub child_id: Option<DbId>,
    pub title: String,
    pub prompt: String,
    pub age_group: String,
    pub language: String,
    pub style: String,
    /// One of [`StoryStatus`]'s wire values.
    pub status: String,
    pub model: Option<String>,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Story {
    /// Parsed status; unknown values read as `Ready`.
    pub fn status(&self) -> StoryStatus {
        StoryStatus::from_name(&self.status).unwrap_or(StoryStatus::Ready)
    }
}

/// DTO for inserting a freshly generated story.
#[derive(Debug, Clone)]
pub struct CreateStory {
    pub child_id: Option<DbId>,
    pub title: String,
    pub prompt: String,
    pub age_group: String,
    pub language: String,
    pub style: String,
    pub model: Option<String>,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}
