//! Reviews domain module.
//!
//! Reviews, comments and the catalogue entities they hang off, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). The
//! one-review-per-author-per-title rule lives in storage; the rating
//! arithmetic lives in `rating`.

pub mod catalog;
pub mod comment;
pub mod rating;
pub mod review;
pub mod score;

pub use catalog::{Category, Genre, NewTitle, Slug, Title};
pub use comment::{Comment, CommentPatch, NewComment};
pub use rating::ScoreSummary;
pub use review::{AuthorRef, NewReview, Review, ReviewPatch};
pub use score::Score;

use yamdb_core::DomainError;

/// Trimmed, non-empty free text.
pub(crate) fn require_text(field: &str, raw: &str) -> Result<String, DomainError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(text.to_string())
}
