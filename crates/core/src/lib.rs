//! `yamdb-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{ConflictKind, DomainError};
pub use id::{CategoryId, CommentId, GenreId, ReviewId, TitleId, UserId};
pub use value_object::ValueObject;
