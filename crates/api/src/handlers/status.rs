//! Busy status for bulk media runs.

use storyteller_core::story::StoryStatus;
use storyteller_core::types::DbId;
use storyteller_db::repositories::StoryRepo;
use storyteller_db::DbPool;

/// Keeps a story in a busy status for the lifetime of a bulk media run.
///
/// [`StatusGuard::finish`] puts the story back to `ready`. If the guard is
/// dropped before that, because a request timeout or a client disconnect
/// cancelled the handler future, the reset is spawned onto the runtime.
pub(crate) struct StatusGuard {
    pool: DbPool,
    parent_id: DbId,
    story_id: DbId,
    armed: bool,
}

impl StatusGuard {
    /// Set `busy` on the story and arm the reset.
    pub(crate) async fn begin(
        pool: &DbPool,
        parent_id: DbId,
        story_id: DbId,
        busy: StoryStatus,
    ) -> Result<Self, sqlx::Error> {
        StoryRepo::set_status(pool, parent_id, story_id, busy).await?;
        Ok(Self {
            pool: pool.clone(),
            parent_id,
            story_id,
            armed: true,
        })
    }

    /// Put the story back to `ready`.
    pub(crate) async fn finish(mut self) -> Result<(), sqlx::Error> {
        let result =
            StoryRepo::set_status(&self.pool, self.parent_id, self.story_id, StoryStatus::Ready)
                .await;
        self.armed = false;
        result.map(|_| ())
    }
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let story_id = self.story_id;
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::error!(story_id, "No runtime left to reset story status");
            return;
        };

        tracing::warn!(story_id, "Media run cancelled, resetting story status");
        let pool = self.pool.clone();
        let parent_id = self.parent_id;
        handle.spawn(async move {
            if let Err(e) =
                StoryRepo::set_status(&pool, parent_id, story_id, StoryStatus::Ready).await
            {
                tracing::error!(story_id, error = %e, "Failed to reset story status");
            }
        });
    }
}
