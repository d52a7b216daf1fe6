//! Route definitions for standalone images.

use axum::routing::post;
use axum::Router;

use crate::handlers::images;
use crate::state::AppState;

/// Routes mounted at `/images`.
///
/// ```text
/// POST / -> generate_standalone (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(images::generate_standalone))
}
