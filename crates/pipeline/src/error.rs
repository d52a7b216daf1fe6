use storyteller_core::error::CoreError;
use storyteller_provider::ProviderError;

/// Failures raised while orchestrating provider calls.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Both story attempts failed; carries the last error.
    #[error("Failed to generate story: {0}")]
    Story(String),

    /// Every candidate image model failed; carries the last error.
    #[error("Image generation returned empty result. {0}")]
    Image(String),

    /// Both learning-pack attempts failed; carries the last error.
    #[error("Failed to generate learning pack: {0}")]
    Learning(String),

    /// A single provider call failed (used by narration).
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
