use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use yamdb_core::{DomainError, ReviewId, TitleId, UserId};

use crate::{Score, require_text};

/// Who wrote a review or comment.
///
/// Usernames never change once registered, so carrying the name alongside
/// the id is safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    pub title_id: TitleId,
    pub author: AuthorRef,
    pub text: String,
    pub score: Score,
    pub pub_date: DateTime<Utc>,
}

impl Review {
    pub fn create(new: NewReview, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let text = require_text("text", &new.text)?;
        Ok(Self {
            id: ReviewId::new(),
            title_id: new.title_id,
            author: new.author,
            text,
            score: new.score,
            pub_date: now,
        })
    }

    /// Apply an edit. Title and author are fixed for the life of a review.
    pub fn apply(&mut self, patch: &ReviewPatch) -> Result<(), DomainError> {
        if let Some(text) = &patch.text {
            self.text = require_text("text", text)?;
        }
        if let Some(score) = patch.score {
            self.score = score;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub title_id: TitleId,
    pub author: AuthorRef,
    pub text: String,
    pub score: Score,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPatch {
    pub text: Option<String>,
    pub score: Option<Score>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_review(text: &str) -> NewReview {
        NewReview {
            title_id: TitleId::new(),
            author: AuthorRef {
                id: UserId::new(),
                username: "critic".to_string(),
            },
            text: text.to_string(),
            score: Score::new(8).unwrap(),
        }
    }

    #[test]
    fn create_trims_text() {
        let review = Review::create(new_review("  great film "), Utc::now()).unwrap();
        assert_eq!(review.text, "great film");
        assert_eq!(review.score.get(), 8);
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(Review::create(new_review("   "), Utc::now()).is_err());
    }

    #[test]
    fn patch_keeps_title_and_author() {
        let mut review = Review::create(new_review("ok"), Utc::now()).unwrap();
        let (title, author) = (review.title_id, review.author.clone());
        review
            .apply(&ReviewPatch {
                text: Some("better on rewatch".to_string()),
                score: Some(Score::new(9).unwrap()),
            })
            .unwrap();
        assert_eq!(review.title_id, title);
        assert_eq!(review.author, author);
        assert_eq!(review.score.get(), 9);
        assert_eq!(review.text, "better on rewatch");
    }

    #[test]
    fn failed_patch_leaves_review_untouched() {
        let mut review = Review::create(new_review("ok"), Utc::now()).unwrap();
        let before = review.clone();
        let err = review.apply(&ReviewPatch {
            text: Some(" ".to_string()),
            score: None,
        });
        assert!(err.is_err());
        assert_eq!(review, before);
    }
}
