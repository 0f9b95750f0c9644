//! Repository layer.
//!
//! Each repository is a zero-sized struct with async methods taking `&PgPool`.
//! Multi-statement writes open their own transaction.

pub mod comment_repo;
pub mod follower_repo;
pub mod invite_code_repo;
pub mod like_repo;
pub mod post_repo;
pub mod session_repo;
pub mod user_repo;

pub use comment_repo::CommentRepo;
pub use follower_repo::FollowerRepo;
pub use invite_code_repo::InviteCodeRepo;
pub use like_repo::LikeRepo;
pub use post_repo::PostRepo;
pub use session_repo::SessionRepo;
pub use user_repo::{OrphanedMedia, UserRepo};
