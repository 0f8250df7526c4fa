use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use yamdb_core::{CommentId, ReviewId, TitleId};
use yamdb_reviews::{AuthorRef, Comment, CommentPatch, NewComment, Review};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{Store, StoreError};

/// Comments scoped to a review, which is itself scoped to a title.
#[derive(Clone)]
pub struct CommentBook {
    store: Arc<dyn Store>,
}

impl CommentBook {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The parent review, or `NotFound` when it does not belong to `title_id`.
    async fn parent(&self, title_id: TitleId, review_id: ReviewId) -> ServiceResult<Review> {
        self.store
            .find_review(title_id, review_id)
            .await?
            .ok_or(ServiceError::NotFound("review"))
    }

    pub async fn create(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
        author: AuthorRef,
        text: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Comment> {
        let review = self.parent(title_id, review_id).await?;
        let comment = Comment::create(
            NewComment {
                review_id: review.id,
                author,
                text: text.to_string(),
            },
            now,
        )?;
        match self.store.insert_comment(comment.clone()).await {
            Ok(()) => {
                info!(comment_id = %comment.id, review_id = %review.id, "comment created");
                Ok(comment)
            }
            Err(StoreError::NotFound) => Err(ServiceError::NotFound("review")),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn get(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
        id: CommentId,
    ) -> ServiceResult<Comment> {
        self.parent(title_id, review_id).await?;
        self.store
            .find_comment(review_id, id)
            .await?
            .ok_or(ServiceError::NotFound("comment"))
    }

    pub async fn list(&self, title_id: TitleId, review_id: ReviewId) -> ServiceResult<Vec<Comment>> {
        self.parent(title_id, review_id).await?;
        Ok(self.store.list_comments(review_id).await?)
    }

    pub async fn update(&self, mut comment: Comment, text: Option<String>) -> ServiceResult<Comment> {
        comment.apply(&CommentPatch { text })?;
        match self.store.update_comment(&comment).await {
            Ok(()) => Ok(comment),
            Err(StoreError::NotFound) => Err(ServiceError::NotFound("comment")),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn delete(&self, comment: &Comment) -> ServiceResult<()> {
        match self.store.delete_comment(comment.review_id, comment.id).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(ServiceError::NotFound("comment")),
            Err(other) => Err(other.into()),
        }
    }
}
