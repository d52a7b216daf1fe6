//! Domain logic for the storyteller backend.
//!
//! Pure code only: validation, kid-safety scanning, the readability report,
//! learning-pack normalization, and export byte builders. Persistence and
//! network access live in the other crates.

pub mod error;
pub mod export;
pub mod learning;
pub mod report;
pub mod safety;
pub mod story;
pub mod types;
pub mod validation;
