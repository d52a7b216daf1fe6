//! Route definitions for the `/stories` resource and its sub-resources.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{export, images, learning, report, share, stories, tts};
use crate::state::AppState;

/// Routes mounted at `/stories`. All require auth.
///
/// ```text
/// GET    /                              -> list (?child_id=)
/// POST   /                              -> create (generate)
/// GET    /{id}                          -> get_by_id
/// DELETE /{id}                          -> delete
/// POST   /{id}/images                   -> illustrate all sections
/// POST   /{id}/sections/{idx}/image     -> illustrate one section
/// POST   /{id}/tts                      -> narrate all sections
/// POST   /{id}/share                    -> create share link (?expires_in_days=)
/// GET    /{id}/report                   -> safety/readability report (?refresh=)
/// GET    /{id}/learning                 -> stored learning pack
/// POST   /{id}/learning                 -> generate learning pack (?refresh=)
/// PUT    /{id}/learning                 -> save edited learning pack
/// GET    /{id}/export/zip               -> ZIP download
/// GET    /{id}/export/pdf               -> PDF download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(stories::list).post(stories::create))
        .route("/{id}", get(stories::get_by_id).delete(stories::delete))
        .route("/{id}/images", post(images::generate_for_story))
        .route("/{id}/sections/{idx}/image", post(images::generate_for_section))
        .route("/{id}/tts", post(tts::generate))
        .route("/{id}/share", post(share::create))
        .route("/{id}/report", get(report::get))
        .route(
            "/{id}/learning",
            get(learning::get)
                .post(learning::generate)
                .put(learning::save_manual),
        )
        .route("/{id}/export/zip", get(export::story_zip))
        .route("/{id}/export/pdf", get(export::story_pdf))
}
