//! Request handlers.
//!
//! One submodule per resource. Handlers validate input with
//! `storyteller_core::validation`, call repositories and pipeline steps,
//! and map failures through [`AppError`](crate::error::AppError).

pub mod auth;
pub mod children;
pub mod export;
pub mod images;
pub mod learning;
pub mod report;
pub mod share;
mod status;
pub mod stories;
pub mod tts;
