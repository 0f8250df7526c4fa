//! Review Ledger: one review per (title, author) and the live rating.
//!
//! Uniqueness is never checked ahead of the insert. The store rejects the
//! second row for a pair inside its own critical section (or by the
//! `reviews_title_author_key` constraint), so of N racing identical creates
//! exactly one succeeds and the rest see `Conflict(Review)`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use yamdb_core::{ConflictKind, ReviewId, TitleId};
use yamdb_reviews::{AuthorRef, NewReview, Review, ReviewPatch, Score};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{Constraint, Store, StoreError};

#[derive(Clone)]
pub struct ReviewLedger {
    store: Arc<dyn Store>,
}

impl ReviewLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record `author`'s review of `title_id`.
    ///
    /// The score is validated before anything is written.
    pub async fn create_review(
        &self,
        title_id: TitleId,
        author: AuthorRef,
        score: i64,
        text: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Review> {
        let score = Score::new(score)?;
        let review = Review::create(
            NewReview {
                title_id,
                author,
                text: text.to_string(),
                score,
            },
            now,
        )?;

        match self.store.insert_review(review.clone()).await {
            Ok(()) => {
                info!(
                    review_id = %review.id,
                    title_id = %title_id,
                    author = %review.author.username,
                    score = review.score.get(),
                    "review created"
                );
                Ok(review)
            }
            Err(StoreError::UniqueViolation(Constraint::ReviewTitleAuthor)) => {
                warn!(
                    title_id = %title_id,
                    author = %review.author.username,
                    "duplicate review rejected"
                );
                Err(ServiceError::Conflict(ConflictKind::Review))
            }
            Err(StoreError::NotFound) => Err(ServiceError::NotFound("title")),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn get_review(&self, title_id: TitleId, id: ReviewId) -> ServiceResult<Review> {
        self.store
            .find_review(title_id, id)
            .await?
            .ok_or(ServiceError::NotFound("review"))
    }

    pub async fn list_reviews(&self, title_id: TitleId) -> ServiceResult<Vec<Review>> {
        if self.store.find_title(title_id).await?.is_none() {
            return Err(ServiceError::NotFound("title"));
        }
        Ok(self.store.list_reviews(title_id).await?)
    }

    /// Apply an edit to an already-loaded (and already-authorized) review.
    pub async fn update_review(
        &self,
        mut review: Review,
        text: Option<String>,
        score: Option<i64>,
    ) -> ServiceResult<Review> {
        let patch = ReviewPatch {
            text,
            score: score.map(Score::new).transpose()?,
        };
        review.apply(&patch)?;
        match self.store.update_review(&review).await {
            Ok(()) => Ok(review),
            Err(StoreError::NotFound) => Err(ServiceError::NotFound("review")),
            Err(other) => Err(other.into()),
        }
    }

    /// Remove a review and, with it, its comments.
    pub async fn delete_review(&self, review: &Review) -> ServiceResult<()> {
        match self.store.delete_review(review.title_id, review.id).await {
            Ok(()) => {
                info!(review_id = %review.id, title_id = %review.title_id, "review deleted");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(ServiceError::NotFound("review")),
            Err(other) => Err(other.into()),
        }
    }

    /// Mean score over the title's current reviews, `None` when it has none.
    pub async fn compute_rating(&self, title_id: TitleId) -> ServiceResult<Option<f64>> {
        Ok(self.store.score_summary(title_id).await?.mean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use yamdb_core::UserId;
    use yamdb_reviews::{NewTitle, Title};

    async fn ledger_with_title() -> (ReviewLedger, Arc<dyn Store>, TitleId) {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let title = Title::create(
            &NewTitle {
                name: "Mirror".to_string(),
                year: 1975,
                description: None,
                category: None,
                genres: vec![],
            },
            None,
            vec![],
            Utc::now(),
        )
        .unwrap();
        let id = title.id;
        store.insert_title(title).await.unwrap();
        (ReviewLedger::new(store.clone()), store, id)
    }

    fn author(name: &str) -> AuthorRef {
        AuthorRef {
            id: UserId::new(),
            username: name.to_string(),
        }
    }

    #[tokio::test]
    async fn parallel_identical_creates_admit_exactly_one() {
        let (ledger, _, title_id) = ledger_with_title().await;
        let critic = author("critic");

        let mut handles = Vec::new();
        for i in 0..32 {
            let ledger = ledger.clone();
            let critic = critic.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .create_review(title_id, critic, 1 + (i % 10), "same take", Utc::now())
                    .await
            }));
        }

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(ServiceError::Conflict(ConflictKind::Review)) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(duplicates, 31);
        assert_eq!(ledger.list_reviews(title_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn out_of_range_score_is_rejected_before_storage() {
        let (ledger, store, title_id) = ledger_with_title().await;
        for score in [0, 11, -3] {
            assert!(matches!(
                ledger
                    .create_review(title_id, author("critic"), score, "meh", Utc::now())
                    .await,
                Err(ServiceError::Validation(_))
            ));
        }
        assert_eq!(store.score_summary(title_id).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn rating_tracks_current_reviews() {
        let (ledger, _, title_id) = ledger_with_title().await;
        let now = Utc::now();
        assert_eq!(ledger.compute_rating(title_id).await.unwrap(), None);

        let first = ledger
            .create_review(title_id, author("a"), 10, "masterpiece", now)
            .await
            .unwrap();
        ledger
            .create_review(title_id, author("b"), 7, "slow but good", now)
            .await
            .unwrap();
        assert_eq!(ledger.compute_rating(title_id).await.unwrap(), Some(8.5));

        ledger.update_review(first.clone(), None, Some(4)).await.unwrap();
        assert_eq!(ledger.compute_rating(title_id).await.unwrap(), Some(5.5));

        ledger.delete_review(&first).await.unwrap();
        assert_eq!(ledger.compute_rating(title_id).await.unwrap(), Some(7.0));
    }

    #[tokio::test]
    async fn patch_with_bad_score_changes_nothing() {
        let (ledger, _, title_id) = ledger_with_title().await;
        let review = ledger
            .create_review(title_id, author("a"), 6, "fine", Utc::now())
            .await
            .unwrap();
        assert!(ledger.update_review(review.clone(), None, Some(42)).await.is_err());
        assert_eq!(
            ledger.get_review(title_id, review.id).await.unwrap().score.get(),
            6
        );
    }

    #[tokio::test]
    async fn reviewing_a_missing_title_is_not_found() {
        let (ledger, _, _) = ledger_with_title().await;
        assert_eq!(
            ledger
                .create_review(TitleId::new(), author("a"), 5, "?", Utc::now())
                .await
                .unwrap_err(),
            ServiceError::NotFound("title")
        );
    }

    #[tokio::test]
    async fn author_may_review_again_after_deleting() {
        let (ledger, _, title_id) = ledger_with_title().await;
        let critic = author("critic");
        let review = ledger
            .create_review(title_id, critic.clone(), 3, "no", Utc::now())
            .await
            .unwrap();
        ledger.delete_review(&review).await.unwrap();
        ledger
            .create_review(title_id, critic, 8, "changed my mind", Utc::now())
            .await
            .unwrap();
    }
}
