//! Route definitions for public share links.

use axum::routing::get;
use axum::Router;

use crate::handlers::share;
use crate::state::AppState;

/// Routes mounted at `/share`. No auth; the token is the credential.
///
/// ```text
/// GET /{token}             -> shared story
/// GET /{token}/export/zip  -> ZIP download
/// GET /{token}/export/pdf  -> PDF download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{token}", get(share::get))
        .route("/{token}/export/zip", get(share::export_zip))
        .route("/{token}/export/pdf", get(share::export_pdf))
}
