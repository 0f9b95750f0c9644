//! Domain types and the media ingestion pipeline shared by the Spartan backend crates.

pub mod error;
pub mod invite;
pub mod media;
pub mod pagination;
pub mod tool;
pub mod types;
