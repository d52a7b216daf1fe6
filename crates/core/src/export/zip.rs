//! ZIP bundle: `story.json` plus one PNG per illustrated chapter.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{ExportError, ExportStory};

/// Build the ZIP archive for a story.
///
/// Images are stored as `images/chapter_NN.png`, numbered from 1 by chapter
/// position; chapters without image bytes are skipped.
pub fn build_zip(story: &ExportStory) -> Result<Vec<u8>, ExportError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    writer.start_file("story.json", options)?;
    writer.write_all(&serde_json::to_vec_pretty(story)?)?;

    for (idx, chapter) in story.chapters.iter().enumerate() {
        if let Some(bytes) = chapter.image_bytes.as_deref().filter(|b| !b.is_empty()) {
            writer.start_file(format!("images/chapter_{:02}.png", idx + 1), options)?;
            writer.write_all(bytes)?;
        }
    }

    Ok(writer.finish()?.into_inner())
}
