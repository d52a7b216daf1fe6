//! Parent authentication.
//!
//! - [`password`] -- Argon2id hashing and verification.
//! - [`jwt`] -- access tokens and opaque refresh tokens.

pub mod jwt;
pub mod password;
