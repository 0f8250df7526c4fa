//! Storage boundary for users, the catalogue, reviews and comments.
//!
//! Services never check-then-insert for uniqueness. Every unique rule
//! (username, email, one review per title and author, slugs) is enforced by
//! the store at write time and reported as `StoreError::UniqueViolation`, so
//! of two racing writers exactly one wins and the other gets a typed error.
//!
//! ## Implementations
//!
//! - `InMemoryStore`: tests/dev; each table sits behind its own lock and the
//!   uniqueness check happens inside the same critical section as the insert.
//! - `PostgresStore`: `UNIQUE` constraints in the schema; SQLSTATE `23505` is
//!   mapped back to the violated `Constraint` by constraint name.

use async_trait::async_trait;
use thiserror::Error;

use yamdb_auth::{AdminUpdate, CodeDigest, Email, ProfileUpdate, Role, User, Username};
use yamdb_core::{CommentId, ConflictKind, ReviewId, TitleId, UserId};
use yamdb_reviews::{Category, Comment, Genre, Review, ScoreSummary, Slug, Title};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// A storage-level uniqueness rule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    Username,
    Email,
    ReviewTitleAuthor,
    CategorySlug,
    GenreSlug,
}

impl Constraint {
    pub fn conflict_kind(self) -> ConflictKind {
        match self {
            Constraint::Username => ConflictKind::Username,
            Constraint::Email => ConflictKind::Email,
            Constraint::ReviewTitleAuthor => ConflictKind::Review,
            Constraint::CategorySlug | Constraint::GenreSlug => ConflictKind::Slug,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0:?}")]
    UniqueViolation(Constraint),

    #[error("record not found")]
    NotFound,

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of the atomic create-or-refresh performed at signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    /// No user had this username or email; the candidate was inserted.
    Created(User),
    /// The exact (username, email) pair exists; its code digest was replaced.
    Refreshed(User),
    /// One of the two collides with a different account.
    Conflict(ConflictKind),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &Username) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> StoreResult<Option<User>>;

    /// All users ordered by username, optionally filtered by a username substring.
    async fn list_users(&self, search: Option<&str>) -> StoreResult<Vec<User>>;

    /// Insert `candidate`, or replace the code digest of the account with the
    /// same username and email, as one atomic step.
    async fn signup(&self, candidate: User, code: CodeDigest) -> StoreResult<SignupOutcome>;

    async fn insert_user(&self, user: User) -> StoreResult<()>;

    // Each write below touches only the columns its caller owns, so a
    // profile edit never carries a stale role or activity flag back in.

    /// Overwrite the profile fields present in `update`.
    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> StoreResult<User>;

    /// Apply an administrator's profile, email and role changes in one step.
    ///
    /// Returns the updated record and the role it held before.
    async fn admin_update(&self, id: UserId, update: &AdminUpdate) -> StoreResult<(User, Role)>;

    /// Set `is_active`. Returns `false` when the flag already had that value.
    async fn set_active(&self, id: UserId, active: bool) -> StoreResult<bool>;

    /// Make the user an active admin with both privilege flags set.
    async fn promote_superuser(&self, id: UserId) -> StoreResult<User>;

    /// Clear the user's code digest if it still equals `code`.
    ///
    /// Returns `false` when another exchange or a newer signup got there first.
    async fn consume_code(&self, id: UserId, code: &CodeDigest) -> StoreResult<bool>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_category(&self, category: Category) -> StoreResult<()>;
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn find_category(&self, slug: &Slug) -> StoreResult<Option<Category>>;
    /// Titles in the category keep existing without one.
    async fn delete_category(&self, slug: &Slug) -> StoreResult<()>;

    async fn insert_genre(&self, genre: Genre) -> StoreResult<()>;
    async fn list_genres(&self) -> StoreResult<Vec<Genre>>;
    async fn find_genre(&self, slug: &Slug) -> StoreResult<Option<Genre>>;
    async fn delete_genre(&self, slug: &Slug) -> StoreResult<()>;

    async fn insert_title(&self, title: Title) -> StoreResult<()>;
    async fn find_title(&self, id: TitleId) -> StoreResult<Option<Title>>;
    async fn list_titles(&self) -> StoreResult<Vec<Title>>;
    /// Removes the title together with its reviews and their comments.
    async fn delete_title(&self, id: TitleId) -> StoreResult<()>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Fails with `UniqueViolation(ReviewTitleAuthor)` when the author already
    /// reviewed the title, and with `NotFound` when the title is gone.
    async fn insert_review(&self, review: Review) -> StoreResult<()>;
    async fn find_review(&self, title_id: TitleId, id: ReviewId) -> StoreResult<Option<Review>>;
    async fn list_reviews(&self, title_id: TitleId) -> StoreResult<Vec<Review>>;
    /// Persists text and score; title and author are never rewritten.
    async fn update_review(&self, review: &Review) -> StoreResult<()>;
    /// Removes the review and its comments.
    async fn delete_review(&self, title_id: TitleId, id: ReviewId) -> StoreResult<()>;
    /// Count and sum of scores from the rows as they are right now.
    async fn score_summary(&self, title_id: TitleId) -> StoreResult<ScoreSummary>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Fails with `NotFound` when the parent review is gone.
    async fn insert_comment(&self, comment: Comment) -> StoreResult<()>;
    async fn find_comment(&self, review_id: ReviewId, id: CommentId) -> StoreResult<Option<Comment>>;
    async fn list_comments(&self, review_id: ReviewId) -> StoreResult<Vec<Comment>>;
    async fn update_comment(&self, comment: &Comment) -> StoreResult<()>;
    async fn delete_comment(&self, review_id: ReviewId, id: CommentId) -> StoreResult<()>;
}

/// Everything the services need from one backing store.
pub trait Store: UserStore + CatalogStore + ReviewStore + CommentStore {}

impl<T> Store for T where T: UserStore + CatalogStore + ReviewStore + CommentStore {}
