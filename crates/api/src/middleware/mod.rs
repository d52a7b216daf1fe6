//! Request extractors.
//!
//! - [`auth::AuthParent`] -- the parent behind a Bearer access token.

pub mod auth;
