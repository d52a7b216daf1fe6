//! Route definitions for the `/children` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::children;
use crate::state::AppState;

/// Routes mounted at `/children`. All require auth.
///
/// ```text
/// GET    /      -> list
/// POST   /      -> create
/// DELETE /{id}  -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(children::list).post(children::create))
        .route("/{id}", delete(children::delete))
}
