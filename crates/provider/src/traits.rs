//! Provider trait.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{Completion, CompletionRequest};

/// Text, image, and speech generation backend.
///
/// Each call is a single request to the provider. Retries and model
/// fallback belong to the caller.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Ask for a JSON-formatted chat completion.
    async fn complete_json(&self, request: &CompletionRequest) -> Result<Completion, ProviderError>;

    /// Generate one image and return its encoded bytes (PNG for the
    /// OpenAI image models).
    async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        size: &str,
    ) -> Result<Vec<u8>, ProviderError>;

    /// Synthesize speech and return the audio file bytes.
    async fn synthesize_speech(
        &self,
        model: &str,
        voice: &str,
        text: &str,
        format: &str,
    ) -> Result<Vec<u8>, ProviderError>;

    /// Provider name, e.g. `"openai"`.
    fn provider_name(&self) -> &'static str;
}
