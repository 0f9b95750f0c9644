//! Request extractors and middleware.
//!
//! - [`auth::AuthUser`] -- caller authenticated by a session-bound Bearer token.
//! - [`auth::MaybeAuthUser`] -- the same, but optional.
//! - [`rbac::RequireAdmin`] -- requires an administrator account.
//! - [`client::ClientInfo`] -- user agent and client IP.
//! - [`rate_limit`] -- per-client sliding-window request limit.

pub mod auth;
pub mod client;
pub mod rate_limit;
pub mod rbac;
