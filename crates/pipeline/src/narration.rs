//! Narration: section text to speech.

use storyteller_core::error::CoreError;
use storyteller_provider::GenerationProvider;

use crate::error::PipelineError;

/// Default speech voice.
pub const DEFAULT_VOICE: &str = "verse";

/// Default audio container.
pub const DEFAULT_AUDIO_FORMAT: &str = "mp3";

/// Collapse whitespace and end on terminal punctuation so the voice pauses
/// at the end of each section.
pub fn prepare_narration_text(text: &str) -> String {
    let mut prepared = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !prepared.is_empty() && !prepared.ends_with(['.', '!', '?']) {
        prepared.push('.');
    }
    prepared
}

/// MIME type for an audio format accepted by the speech endpoint.
pub fn audio_content_type(format: &str) -> &'static str {
    match format {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "opus" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// Synthesize one section's narration.
pub async fn narrate(
    provider: &dyn GenerationProvider,
    model: &str,
    voice: &str,
    text: &str,
    format: &str,
) -> Result<Vec<u8>, PipelineError> {
    let input = prepare_narration_text(text);
    if input.is_empty() {
        return Err(CoreError::Validation("Section text is empty".into()).into());
    }
    let audio = provider.synthesize_speech(model, voice, &input, format).await?;
    tracing::debug!(voice, format, bytes = audio.len(), "Narration synthesized");
    Ok(audio)
}
