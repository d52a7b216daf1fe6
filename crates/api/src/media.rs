//! Storage for generated images and narration audio.
//!
//! Handlers write media through [`MediaStore`] and persist the returned URL
//! on the section row. Keys are relative paths such as
//! `story_12/sec_3.png`; see [`section_image_key`] and friends.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use storyteller_core::types::DbId;

use crate::config::{MediaBackend, MediaConfig};

/// URL prefix under which the local backend's files are served.
pub const LOCAL_MEDIA_PREFIX: &str = "/media/";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Media I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Media upload failed ({status}): {body}")]
    Upload { status: u16, body: String },

    #[error("Invalid media key: {0}")]
    InvalidKey(String),
}

/// Pluggable media backend.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `bytes` under `key` (overwriting) and return the public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, MediaError>;

    /// Load bytes for a URL previously returned by [`MediaStore::put`].
    ///
    /// `Ok(None)` when the URL does not belong to this store or the object
    /// is gone.
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>, MediaError>;

    fn backend_name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

pub fn story_folder(story_id: DbId) -> String {
    format!("story_{story_id}")
}

pub fn section_image_key(story_id: DbId, idx: i32) -> String {
    format!("{}/sec_{idx}.png", story_folder(story_id))
}

pub fn section_audio_key(story_id: DbId, idx: i32, ext: &str) -> String {
    format!("{}/sec_{idx}.{ext}", story_folder(story_id))
}

/// Key for a one-off image not tied to a story: `img_<8 hex>/sec_0.png`.
pub fn standalone_image_key() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("img_{}/sec_0.png", &id[..8])
}

/// Reject absolute keys and any `..` segment.
fn validate_key(key: &str) -> Result<&Path, MediaError> {
    let path = Path::new(key);
    let ok = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(path)
    } else {
        Err(MediaError::InvalidKey(key.to_string()))
    }
}

/// Build the configured backend.
pub fn build_media_store(config: &MediaConfig, http: reqwest::Client) -> Arc<dyn MediaStore> {
    match &config.backend {
        MediaBackend::Local => Arc::new(LocalMediaStore::new(config.dir.clone())),
        MediaBackend::Supabase {
            url,
            service_role_key,
            bucket,
        } => Arc::new(SupabaseMediaStore::new(
            http,
            url.clone(),
            service_role_key.clone(),
            bucket.clone(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Local filesystem
// ---------------------------------------------------------------------------

/// Files under a root directory, served by the router at `/media`.
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, MediaError> {
        let path = self.root.join(validate_key(key)?);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(key, bytes = bytes.len(), "Media stored locally");
        Ok(format!("{LOCAL_MEDIA_PREFIX}{key}"))
    }

    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>, MediaError> {
        let Some(key) = url.strip_prefix(LOCAL_MEDIA_PREFIX) else {
            return Ok(None);
        };
        let path = self.root.join(validate_key(key)?);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

// ---------------------------------------------------------------------------
// Supabase Storage
// ---------------------------------------------------------------------------

/// Objects in a public Supabase Storage bucket.
pub struct SupabaseMediaStore {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
    bucket: String,
}

impl SupabaseMediaStore {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        service_role_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_role_key: service_role_key.into(),
            bucket: bucket.into(),
        }
    }

    fn upload_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{key}", self.base_url, self.bucket)
    }

    /// Public read URL; also the prefix [`MediaStore::get`] recognizes.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{key}",
            self.base_url, self.bucket
        )
    }
}

#[async_trait]
impl MediaStore for SupabaseMediaStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, MediaError> {
        validate_key(key)?;
        let response = self
            .client
            .post(self.upload_url(key))
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Upload {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(key, bucket = %self.bucket, "Media uploaded");
        Ok(self.public_url(key))
    }

    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>, MediaError> {
        if !url.starts_with(&self.public_url("")) {
            return Ok(None);
        }
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        Ok(Some(response.bytes().await?.to_vec()))
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}
