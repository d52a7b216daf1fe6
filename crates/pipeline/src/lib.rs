//! Generation pipeline over a [`GenerationProvider`].
//!
//! - [`story`] -- prompt building, structured-output attempts, and lenient
//!   normalization of the model's JSON into exactly `n` sections.
//! - [`illustration`] -- prompt sanitization and the image-model fallback chain.
//! - [`narration`] -- text preparation for speech synthesis.
//! - [`learning`] -- learning-pack generation.
//!
//! Every function takes the provider as `&dyn GenerationProvider` so the API
//! layer can swap in a test double.
//!
//! [`GenerationProvider`]: storyteller_provider::GenerationProvider

pub mod error;
pub mod illustration;
pub mod learning;
pub mod narration;
pub mod story;

#[cfg(test)]
pub(crate) mod testing;

pub use error::PipelineError;
