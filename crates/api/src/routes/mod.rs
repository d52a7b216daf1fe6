pub mod auth;
pub mod children;
pub mod health;
pub mod images;
pub mod share;
pub mod stories;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register, /auth/login, /auth/refresh        public
/// /auth/logout, /auth/me                            requires auth
///
/// /children                                         list, create
/// /children/{id}                                    delete
///
/// /stories                                          list, generate
/// /stories/{id}                                     get, delete
/// /stories/{id}/images                              illustrate all
/// /stories/{id}/sections/{idx}/image                illustrate one
/// /stories/{id}/tts                                 narrate
/// /stories/{id}/share                               create share link
/// /stories/{id}/report                              report
/// /stories/{id}/learning                            get, generate, save
/// /stories/{id}/export/{zip,pdf}                    downloads
///
/// /images                                           standalone image
///
/// /share/{token}                                    public story
/// /share/{token}/export/{zip,pdf}                   public downloads
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth (register/login/refresh public; logout/me require auth).
        .nest("/auth", auth::router())
        // Child profiles.
        .nest("/children", children::router())
        // Stories and their media, report, learning, sharing, exports.
        .nest("/stories", stories::router())
        // One-off images.
        .nest("/images", images::router())
        // Public share links.
        .nest("/share", share::router())
}
