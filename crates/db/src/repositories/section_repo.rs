//! Repository for the `story_sections` table.
//!
//! Callers resolve story ownership first; these methods trust `story_id`.

use sqlx::PgPool;
use storyteller_core::types::DbId;

use crate::models::section::StorySection;

const COLUMNS: &str = "id, story_id, idx, title, text, image_prompt, image_url, audio_url, \
                        created_at, updated_at";

pub struct SectionRepo;

impl SectionRepo {
    /// All sections of a story ordered by `idx`.
    pub async fn list_for_story(
        pool: &PgPool,
        story_id: DbId,
    ) -> Result<Vec<StorySection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM story_sections WHERE story_id = $1 ORDER BY idx");
        sqlx::query_as::<_, StorySection>(&query)
            .bind(story_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        story_id: DbId,
        idx: i32,
    ) -> Result<Option<StorySection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM story_sections WHERE story_id = $1 AND idx = $2");
        sqlx::query_as::<_, StorySection>(&query)
            .bind(story_id)
            .bind(idx)
            .fetch_optional(pool)
            .await
    }

    /// Record a generated illustration URL.
    pub async fn set_image_url(
        pool: &PgPool,
        story_id: DbId,
        idx: i32,
        url: &str,
    ) -> Result<Option<StorySection>, sqlx::Error> {
        let query = format!(
            "UPDATE story_sections SET image_url = $3
             WHERE story_id = $1 AND idx = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StorySection>(&query)
            .bind(story_id)
            .bind(idx)
            .bind(url)
            .fetch_optional(pool)
            .await
    }

    /// Record a generated narration URL.
    pub async fn set_audio_url(
        pool: &PgPool,
        story_id: DbId,
        idx: i32,
        url: &str,
    ) -> Result<Option<StorySection>, sqlx::Error> {
        let query = format!(
            "UPDATE story_sections SET audio_url = $3
             WHERE story_id = $1 AND idx = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StorySection>(&query)
            .bind(story_id)
            .bind(idx)
            .bind(url)
            .fetch_optional(pool)
            .await
    }
}
