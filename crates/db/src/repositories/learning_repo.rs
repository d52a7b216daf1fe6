//! Repository for the `story_learning` table.

use sqlx::types::Json;
use sqlx::PgPool;
use storyteller_core::learning::LearningPack;
use storyteller_core::types::DbId;

use crate::models::learning::StoryLearning;

const COLUMNS: &str = "story_id, summary, questions, vocabulary, created_at, updated_at";

pub struct LearningRepo;

impl LearningRepo {
    pub async fn find(pool: &PgPool, story_id: DbId) -> Result<Option<StoryLearning>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM story_learning WHERE story_id = $1");
        sqlx::query_as::<_, StoryLearning>(&query)
            .bind(story_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace the learning pack for a story.
    pub async fn upsert(
        pool: &PgPool,
        story_id: DbId,
        pack: &LearningPack,
    ) -> Result<StoryLearning, sqlx::Error> {
        let query = format!(
            "INSERT INTO story_learning (story_id, summary, questions, vocabulary)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (story_id) DO UPDATE SET
                summary = EXCLUDED.summary,
                questions = EXCLUDED.questions,
                vocabulary = EXCLUDED.vocabulary
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StoryLearning>(&query)
            .bind(story_id)
            .bind(&pack.summary)
            .bind(Json(&pack.questions))
            .bind(Json(&pack.vocabulary))
            .fetch_one(pool)
            .await
    }
}
