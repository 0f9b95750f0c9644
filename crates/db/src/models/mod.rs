//! Row models and DTOs.
//!
//! Row structs derive `FromRow`. Structs returned to API clients also derive
//! `Serialize` with camelCase field names; [`user::User`] never does.

pub mod comment;
pub mod invite_code;
pub mod post;
pub mod session;
pub mod user;
