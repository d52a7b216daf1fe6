//! Learning-pack row.

use sqlx::types::Json;
use sqlx::FromRow;
use storyteller_core::learning::{LearningPack, LearningQuestion, VocabularyItem};
use storyteller_core::types::{DbId, Timestamp};

/// A row from the `story_learning` table.
#[derive(Debug, Clone, FromRow)]
pub struct StoryLearning {
    pub story_id: DbId,
    pub summary: String,
    pub questions: Json<Vec<LearningQuestion>>,
    pub vocabulary: Json<Vec<VocabularyItem>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<StoryLearning> for LearningPack {
    fn from(row: StoryLearning) -> Self {
        Self {
            summary: row.summary,
            questions: row.questions.0,
            vocabulary: row.vocabulary.0,
        }
    }
}
