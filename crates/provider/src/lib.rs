//! Client for the generative-AI provider.
//!
//! [`GenerationProvider`] is the seam the pipeline talks to; [`OpenAiProvider`]
//! implements it over HTTP against an OpenAI-compatible API (chat
//! completions, image generation, speech synthesis).

pub mod config;
pub mod error;
pub mod openai;
pub mod traits;
pub mod types;

pub use config::ProviderConfig;
pub use error::ProviderError;
pub use openai::OpenAiProvider;
pub use traits::GenerationProvider;
pub use types::{Completion, CompletionRequest, ResponseFormat, Usage};
