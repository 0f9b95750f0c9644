//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- session-bound access tokens and token digests.

pub mod jwt;
pub mod password;
