use std::sync::Arc;

use storyteller_provider::{GenerationProvider, ProviderConfig};

use crate::config::ServerConfig;
use crate::media::MediaStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: storyteller_db::DbPool,
    /// Server configuration (JWT settings, share link origin).
    pub config: Arc<ServerConfig>,
    /// Text, image, and speech generation backend.
    pub provider: Arc<dyn GenerationProvider>,
    /// Model names and image policy for the provider.
    pub provider_config: Arc<ProviderConfig>,
    /// Storage for generated images and audio.
    pub media: Arc<dyn MediaStore>,
    /// Client for fetching remote images during export.
    pub http: reqwest::Client,
}
