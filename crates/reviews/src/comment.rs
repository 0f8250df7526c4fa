use chrono::{DateTime, Utc};

use yamdb_core::{CommentId, DomainError, ReviewId};

use crate::{AuthorRef, require_text};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub review_id: ReviewId,
    pub author: AuthorRef,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

impl Comment {
    pub fn create(new: NewComment, now: DateTime<Utc>) -> Result<Self, DomainError> {
        Ok(Self {
            id: CommentId::new(),
            review_id: new.review_id,
            author: new.author,
            text: require_text("text", &new.text)?,
            pub_date: now,
        })
    }

    pub fn apply(&mut self, patch: &CommentPatch) -> Result<(), DomainError> {
        if let Some(text) = &patch.text {
            self.text = require_text("text", text)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub review_id: ReviewId,
    pub author: AuthorRef,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentPatch {
    pub text: Option<String>,
}
