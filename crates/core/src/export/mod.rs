//! Downloadable story bundles.
//!
//! [`ExportStory`] is the flattened, storage-agnostic view of a story that
//! the ZIP and PDF builders consume. Image bytes are loaded by the caller.

pub mod pdf;
pub mod zip;

use serde::Serialize;

use crate::types::DbId;

/// Author recorded in exported bundles.
pub const EXPORT_AUTHOR: &str = "openai";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("ZIP error: {0}")]
    Zip(#[from] ::zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One chapter of an exported story.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportChapter {
    pub title: String,
    pub text: String,
    pub image_prompt: Option<String>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    /// Raw image bytes; never serialized.
    #[serde(skip)]
    pub image_bytes: Option<Vec<u8>>,
}

/// A story ready to be packaged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportStory {
    pub story_id: DbId,
    pub title: String,
    pub author: String,
    pub age_group: String,
    pub language: String,
    pub style: String,
    #[serde(rename = "sections")]
    pub chapters: Vec<ExportChapter>,
}

/// File name offered for download: the lowercased title with spaces as
/// underscores, followed by `suffix` (e.g. `.pdf` or `_story.zip`).
pub fn download_filename(title: &str, suffix: &str) -> String {
    let title = title.trim();
    let base = if title.is_empty() { "story" } else { title };
    format!("{}{suffix}", base.to_lowercase().replace(' ', "_"))
}
