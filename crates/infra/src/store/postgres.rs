//! Postgres-backed implementation of the store traits.
//!
//! ## Error Mapping
//!
//! | SQLx error | SQLSTATE | StoreError |
//! |------------|----------|------------|
//! | unique violation | `23505` | `UniqueViolation(constraint)`, looked up by constraint name |
//! | foreign key violation | `23503` | `NotFound` (the parent row is gone) |
//! | anything else | | `Unavailable` |
//!
//! Cascades (title to reviews to comments) are `ON DELETE CASCADE` in the
//! schema, so deletes are single statements.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use yamdb_auth::{AdminUpdate, CodeDigest, Email, ProfileUpdate, Role, User, Username};
use yamdb_core::{CategoryId, CommentId, ConflictKind, GenreId, ReviewId, TitleId, UserId};
use yamdb_reviews::{
    AuthorRef, Category, Comment, Genre, Review, Score, ScoreSummary, Slug, Title,
};

use super::{
    CatalogStore, CommentStore, Constraint, ReviewStore, SignupOutcome, StoreError, StoreResult,
    UserStore,
};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// A signup races other writers on the same rows at most this many times.
const SIGNUP_ATTEMPTS: usize = 3;

pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the schema. Every statement is idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn load_titles(&self, only: Option<TitleId>) -> StoreResult<Vec<Title>> {
        let only = only.map(Uuid::from);

        let rows = sqlx::query(
            r#"
            SELECT
                t.id,
                t.name,
                t.year,
                t.description,
                c.id   AS category_id,
                c.name AS category_name,
                c.slug AS category_slug
            FROM titles t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE ($1::uuid IS NULL OR t.id = $1)
            ORDER BY t.id
            "#,
        )
        .bind(only)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_titles", e))?;

        let genre_rows = sqlx::query(
            r#"
            SELECT gt.title_id, g.id, g.name, g.slug
            FROM genre_titles gt
            JOIN genres g ON g.id = gt.genre_id
            WHERE ($1::uuid IS NULL OR gt.title_id = $1)
            ORDER BY g.slug
            "#,
        )
        .bind(only)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_title_genres", e))?;

        let mut genres: HashMap<Uuid, Vec<Genre>> = HashMap::new();
        for row in genre_rows {
            let title_id: Uuid = row.try_get("title_id").map_err(corrupt("genre_titles"))?;
            let genre = genre_from_row(&row)?;
            genres.entry(title_id).or_default().push(genre);
        }

        rows.iter()
            .map(|row| -> StoreResult<Title> {
                let title = TitleRow::from_row(row).map_err(corrupt("titles"))?;
                let genres = genres.remove(&title.id).unwrap_or_default();
                title.into_title(genres)
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &Username) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_username", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users(&self, search: Option<&str>) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL OR strpos(lower(username), lower($1)) > 0)
            ORDER BY username COLLATE "C"
            "#,
        )
        .bind(search)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip_all, fields(username = %candidate.username), err)]
    async fn signup(&self, candidate: User, code: CodeDigest) -> StoreResult<SignupOutcome> {
        for _ in 0..SIGNUP_ATTEMPTS {
            let inserted = sqlx::query(
                r#"
                INSERT INTO users (
                    id, username, email, role, bio, first_name, last_name,
                    is_staff, is_superuser, is_active, confirmation_digest, date_joined
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT DO NOTHING
                RETURNING *
                "#,
            )
            .bind(candidate.id.as_uuid())
            .bind(candidate.username.as_str())
            .bind(candidate.email.as_str())
            .bind(candidate.role.as_str())
            .bind(&candidate.bio)
            .bind(&candidate.first_name)
            .bind(&candidate.last_name)
            .bind(candidate.is_staff)
            .bind(candidate.is_superuser)
            .bind(candidate.is_active)
            .bind(code.as_str())
            .bind(candidate.date_joined)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("signup_insert", e))?;
            if let Some(row) = inserted {
                return Ok(SignupOutcome::Created(user_from_row(&row)?));
            }

            let refreshed = sqlx::query(
                r#"
                UPDATE users SET confirmation_digest = $3
                WHERE username = $1 AND email = $2
                RETURNING *
                "#,
            )
            .bind(candidate.username.as_str())
            .bind(candidate.email.as_str())
            .bind(code.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("signup_refresh", e))?;
            if let Some(row) = refreshed {
                return Ok(SignupOutcome::Refreshed(user_from_row(&row)?));
            }

            let clash = sqlx::query(
                r#"
                SELECT username = $1 AS same_username
                FROM users
                WHERE username = $1 OR email = $2
                ORDER BY same_username DESC
                LIMIT 1
                "#,
            )
            .bind(candidate.username.as_str())
            .bind(candidate.email.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("signup_conflict", e))?;
            if let Some(row) = clash {
                let same_username: bool =
                    row.try_get("same_username").map_err(corrupt("users"))?;
                let kind = if same_username {
                    ConflictKind::Username
                } else {
                    ConflictKind::Email
                };
                return Ok(SignupOutcome::Conflict(kind));
            }
            // The conflicting row changed between statements; start over.
        }
        Err(StoreError::Unavailable(
            "signup kept racing concurrent writers".to_string(),
        ))
    }

    #[instrument(skip_all, fields(username = %user.username), err)]
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, role, bio, first_name, last_name,
                is_staff, is_superuser, is_active, confirmation_digest, date_joined
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.role.as_str())
        .bind(&user.bio)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.is_active)
        .bind(user.confirmation.as_ref().map(CodeDigest::as_str))
        .bind(user.date_joined)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self, update), err)]
    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> StoreResult<User> {
        let row = sqlx::query(
            r#"
            UPDATE users SET
                bio = COALESCE($2, bio),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(update.bio.as_deref())
        .bind(update.first_name.as_deref())
        .bind(update.last_name.as_deref())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_profile", e))?
        .ok_or(StoreError::NotFound)?;
        user_from_row(&row)
    }

    #[instrument(skip(self, update), err)]
    async fn admin_update(&self, id: UserId, update: &AdminUpdate) -> StoreResult<(User, Role)> {
        // The CTE locks the row so the returned previous role is the one replaced.
        let row = sqlx::query(
            r#"
            WITH previous AS (
                SELECT id, role AS previous_role FROM users WHERE id = $1 FOR UPDATE
            )
            UPDATE users u SET
                bio = COALESCE($2, u.bio),
                first_name = COALESCE($3, u.first_name),
                last_name = COALESCE($4, u.last_name),
                email = COALESCE($5, u.email),
                role = COALESCE($6, u.role)
            FROM previous
            WHERE u.id = previous.id
            RETURNING u.*, previous.previous_role
            "#,
        )
        .bind(id.as_uuid())
        .bind(update.profile.bio.as_deref())
        .bind(update.profile.first_name.as_deref())
        .bind(update.profile.last_name.as_deref())
        .bind(update.email.as_ref().map(Email::as_str))
        .bind(update.role.as_ref().map(Role::as_str))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("admin_update", e))?
        .ok_or(StoreError::NotFound)?;

        let previous: String = row.try_get("previous_role").map_err(corrupt("users"))?;
        let previous = previous.parse::<Role>().map_err(corrupt("users"))?;
        Ok((user_from_row(&row)?, previous))
    }

    #[instrument(skip(self), err)]
    async fn set_active(&self, id: UserId, active: bool) -> StoreResult<bool> {
        let row = sqlx::query(
            r#"
            WITH target AS (
                SELECT id, is_active AS was_active FROM users WHERE id = $1 FOR UPDATE
            )
            UPDATE users u SET is_active = $2
            FROM target
            WHERE u.id = target.id
            RETURNING target.was_active
            "#,
        )
        .bind(id.as_uuid())
        .bind(active)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_active", e))?
        .ok_or(StoreError::NotFound)?;
        let was_active: bool = row.try_get("was_active").map_err(corrupt("users"))?;
        Ok(was_active != active)
    }

    #[instrument(skip(self), err)]
    async fn promote_superuser(&self, id: UserId) -> StoreResult<User> {
        let row = sqlx::query(
            r#"
            UPDATE users SET
                role = 'admin',
                is_staff = TRUE,
                is_superuser = TRUE,
                is_active = TRUE
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("promote_superuser", e))?
        .ok_or(StoreError::NotFound)?;
        user_from_row(&row)
    }

    #[instrument(skip(self, code), err)]
    async fn consume_code(&self, id: UserId, code: &CodeDigest) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET confirmation_digest = NULL
            WHERE id = $1 AND confirmation_digest = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(code.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("consume_code", e))?;
        Ok(result.rows_affected() == 1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalogue
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn insert_category(&self, category: Category) -> StoreResult<()> {
        sqlx::query("INSERT INTO categories (id, name, slug) VALUES ($1, $2, $3)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(category.slug.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, slug FROM categories ORDER BY slug")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;
        rows.iter().map(category_from_row).collect()
    }

    async fn find_category(&self, slug: &Slug) -> StoreResult<Option<Category>> {
        let row = sqlx::query("SELECT id, name, slug FROM categories WHERE slug = $1")
            .bind(slug.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_category", e))?;
        row.as_ref().map(category_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_category(&self, slug: &Slug) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE slug = $1")
            .bind(slug.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn insert_genre(&self, genre: Genre) -> StoreResult<()> {
        sqlx::query("INSERT INTO genres (id, name, slug) VALUES ($1, $2, $3)")
            .bind(genre.id.as_uuid())
            .bind(&genre.name)
            .bind(genre.slug.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_genre", e))?;
        Ok(())
    }

    async fn list_genres(&self) -> StoreResult<Vec<Genre>> {
        let rows = sqlx::query("SELECT id, name, slug FROM genres ORDER BY slug")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_genres", e))?;
        rows.iter().map(genre_from_row).collect()
    }

    async fn find_genre(&self, slug: &Slug) -> StoreResult<Option<Genre>> {
        let row = sqlx::query("SELECT id, name, slug FROM genres WHERE slug = $1")
            .bind(slug.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_genre", e))?;
        row.as_ref().map(genre_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_genre(&self, slug: &Slug) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM genres WHERE slug = $1")
            .bind(slug.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_genre", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip_all, fields(title_id = %title.id), err)]
    async fn insert_title(&self, title: Title) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            "INSERT INTO titles (id, name, year, description, category_id) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(title.id.as_uuid())
        .bind(&title.name)
        .bind(title.year)
        .bind(title.description.as_deref())
        .bind(title.category.as_ref().map(|c| *c.id.as_uuid()))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_title", e))?;

        for genre in &title.genres {
            sqlx::query("INSERT INTO genre_titles (title_id, genre_id) VALUES ($1, $2)")
                .bind(title.id.as_uuid())
                .bind(genre.id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("insert_genre_title", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    async fn find_title(&self, id: TitleId) -> StoreResult<Option<Title>> {
        Ok(self.load_titles(Some(id)).await?.into_iter().next())
    }

    async fn list_titles(&self) -> StoreResult<Vec<Title>> {
        self.load_titles(None).await
    }

    #[instrument(skip(self), err)]
    async fn delete_title(&self, id: TitleId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_title", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reviews and comments
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ReviewStore for PostgresStore {
    #[instrument(
        skip_all,
        fields(title_id = %review.title_id, author = %review.author.username),
        err
    )]
    async fn insert_review(&self, review: Review) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, title_id, author_id, author_username, text, score, pub_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.title_id.as_uuid())
        .bind(review.author.id.as_uuid())
        .bind(&review.author.username)
        .bind(&review.text)
        .bind(i16::from(review.score.get()))
        .bind(review.pub_date)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_review", e))?;
        Ok(())
    }

    async fn find_review(&self, title_id: TitleId, id: ReviewId) -> StoreResult<Option<Review>> {
        let row = sqlx::query("SELECT * FROM reviews WHERE id = $1 AND title_id = $2")
            .bind(id.as_uuid())
            .bind(title_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_review", e))?;
        row.as_ref().map(review_from_row).transpose()
    }

    async fn list_reviews(&self, title_id: TitleId) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query("SELECT * FROM reviews WHERE title_id = $1 ORDER BY pub_date, id")
            .bind(title_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_reviews", e))?;
        rows.iter().map(review_from_row).collect()
    }

    #[instrument(skip_all, fields(review_id = %review.id), err)]
    async fn update_review(&self, review: &Review) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE reviews SET text = $3, score = $4 WHERE id = $1 AND title_id = $2",
        )
        .bind(review.id.as_uuid())
        .bind(review.title_id.as_uuid())
        .bind(&review.text)
        .bind(i16::from(review.score.get()))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_review", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_review(&self, title_id: TitleId, id: ReviewId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1 AND title_id = $2")
            .bind(id.as_uuid())
            .bind(title_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_review", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn score_summary(&self, title_id: TitleId) -> StoreResult<ScoreSummary> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*)::BIGINT AS count, COALESCE(SUM(score), 0)::BIGINT AS total
            FROM reviews
            WHERE title_id = $1
            "#,
        )
        .bind(title_id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("score_summary", e))?;
        let count: i64 = row.try_get("count").map_err(corrupt("reviews"))?;
        let total: i64 = row.try_get("total").map_err(corrupt("reviews"))?;
        Ok(ScoreSummary {
            count: count.max(0) as u64,
            total: total.max(0) as u64,
        })
    }
}

#[async_trait]
impl CommentStore for PostgresStore {
    #[instrument(skip_all, fields(review_id = %comment.review_id), err)]
    async fn insert_comment(&self, comment: Comment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, review_id, author_id, author_username, text, pub_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(comment.id.as_uuid())
        .bind(comment.review_id.as_uuid())
        .bind(comment.author.id.as_uuid())
        .bind(&comment.author.username)
        .bind(&comment.text)
        .bind(comment.pub_date)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_comment", e))?;
        Ok(())
    }

    async fn find_comment(&self, review_id: ReviewId, id: CommentId) -> StoreResult<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = $1 AND review_id = $2")
            .bind(id.as_uuid())
            .bind(review_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_comment", e))?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn list_comments(&self, review_id: ReviewId) -> StoreResult<Vec<Comment>> {
        let rows =
            sqlx::query("SELECT * FROM comments WHERE review_id = $1 ORDER BY pub_date, id")
                .bind(review_id.as_uuid())
                .fetch_all(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("list_comments", e))?;
        rows.iter().map(comment_from_row).collect()
    }

    #[instrument(skip_all, fields(comment_id = %comment.id), err)]
    async fn update_comment(&self, comment: &Comment) -> StoreResult<()> {
        let result = sqlx::query("UPDATE comments SET text = $3 WHERE id = $1 AND review_id = $2")
            .bind(comment.id.as_uuid())
            .bind(comment.review_id.as_uuid())
            .bind(&comment.text)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_comment", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_comment(&self, review_id: ReviewId, id: CommentId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND review_id = $2")
            .bind(id.as_uuid())
            .bind(review_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_comment", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

fn constraint_by_name(name: &str) -> Option<Constraint> {
    match name {
        "users_username_key" => Some(Constraint::Username),
        "users_email_key" => Some(Constraint::Email),
        "reviews_title_author_key" => Some(Constraint::ReviewTitleAuthor),
        "categories_slug_key" => Some(Constraint::CategorySlug),
        "genres_slug_key" => Some(Constraint::GenreSlug),
        _ => None,
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => db_err
                    .constraint()
                    .and_then(constraint_by_name)
                    .map(StoreError::UniqueViolation)
                    .unwrap_or(StoreError::Unavailable(msg)),
                Some("23503") => StoreError::NotFound,
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Unavailable(format!("sqlx error in {operation}: {other}")),
    }
}

fn corrupt<E: std::fmt::Display>(table: &'static str) -> impl Fn(E) -> StoreError {
    move |e| StoreError::Unavailable(format!("unreadable {table} row: {e}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Row types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    role: String,
    bio: String,
    first_name: String,
    last_name: String,
    is_staff: bool,
    is_superuser: bool,
    is_active: bool,
    confirmation_digest: Option<String>,
    date_joined: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
            bio: row.try_get("bio")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            is_staff: row.try_get("is_staff")?,
            is_superuser: row.try_get("is_superuser")?,
            is_active: row.try_get("is_active")?,
            confirmation_digest: row.try_get("confirmation_digest")?,
            date_joined: row.try_get("date_joined")?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::from_uuid(row.id),
            username: Username::parse(&row.username).map_err(corrupt("users"))?,
            email: Email::parse(&row.email).map_err(corrupt("users"))?,
            role: row.role.parse::<Role>().map_err(corrupt("users"))?,
            bio: row.bio,
            first_name: row.first_name,
            last_name: row.last_name,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            is_active: row.is_active,
            confirmation: row.confirmation_digest.map(CodeDigest::from_stored),
            date_joined: row.date_joined,
        })
    }
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    UserRow::from_row(row).map_err(corrupt("users"))?.try_into()
}

fn category_from_row(row: &PgRow) -> StoreResult<Category> {
    CategoryRow::from_row(row).map_err(corrupt("categories"))?.try_into()
}

fn genre_from_row(row: &PgRow) -> StoreResult<Genre> {
    GenreRow::from_row(row).map_err(corrupt("genres"))?.try_into()
}

fn review_from_row(row: &PgRow) -> StoreResult<Review> {
    ReviewRow::from_row(row).map_err(corrupt("reviews"))?.try_into()
}

fn comment_from_row(row: &PgRow) -> StoreResult<Comment> {
    Ok(CommentRow::from_row(row).map_err(corrupt("comments"))?.into())
}

#[derive(Debug)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
}

impl<'r> FromRow<'r, PgRow> for CategoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CategoryRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
        })
    }
}

impl TryFrom<CategoryRow> for Category {
    type Error = StoreError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Category {
            id: CategoryId::from_uuid(row.id),
            name: row.name,
            slug: Slug::parse(&row.slug).map_err(corrupt("categories"))?,
        })
    }
}

#[derive(Debug)]
struct GenreRow {
    id: Uuid,
    name: String,
    slug: String,
}

impl<'r> FromRow<'r, PgRow> for GenreRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(GenreRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
        })
    }
}

impl TryFrom<GenreRow> for Genre {
    type Error = StoreError;

    fn try_from(row: GenreRow) -> Result<Self, Self::Error> {
        Ok(Genre {
            id: GenreId::from_uuid(row.id),
            name: row.name,
            slug: Slug::parse(&row.slug).map_err(corrupt("genres"))?,
        })
    }
}

#[derive(Debug)]
struct TitleRow {
    id: Uuid,
    name: String,
    year: i32,
    description: Option<String>,
    category: Option<CategoryRow>,
}

impl<'r> FromRow<'r, PgRow> for TitleRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let category_id: Option<Uuid> = row.try_get("category_id")?;
        let category = match category_id {
            Some(id) => Some(CategoryRow {
                id,
                name: row.try_get("category_name")?,
                slug: row.try_get("category_slug")?,
            }),
            None => None,
        };
        Ok(TitleRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            year: row.try_get("year")?,
            description: row.try_get("description")?,
            category,
        })
    }
}

impl TitleRow {
    fn into_title(self, genres: Vec<Genre>) -> StoreResult<Title> {
        Ok(Title {
            id: TitleId::from_uuid(self.id),
            name: self.name,
            year: self.year,
            description: self.description,
            category: self.category.map(Category::try_from).transpose()?,
            genres,
        })
    }
}

#[derive(Debug)]
struct ReviewRow {
    id: Uuid,
    title_id: Uuid,
    author_id: Uuid,
    author_username: String,
    text: String,
    score: i16,
    pub_date: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ReviewRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ReviewRow {
            id: row.try_get("id")?,
            title_id: row.try_get("title_id")?,
            author_id: row.try_get("author_id")?,
            author_username: row.try_get("author_username")?,
            text: row.try_get("text")?,
            score: row.try_get("score")?,
            pub_date: row.try_get("pub_date")?,
        })
    }
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Review {
            id: ReviewId::from_uuid(row.id),
            title_id: TitleId::from_uuid(row.title_id),
            author: AuthorRef {
                id: UserId::from_uuid(row.author_id),
                username: row.author_username,
            },
            text: row.text,
            score: Score::new(i64::from(row.score)).map_err(corrupt("reviews"))?,
            pub_date: row.pub_date,
        })
    }
}

#[derive(Debug)]
struct CommentRow {
    id: Uuid,
    review_id: Uuid,
    author_id: Uuid,
    author_username: String,
    text: String,
    pub_date: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for CommentRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CommentRow {
            id: row.try_get("id")?,
            review_id: row.try_get("review_id")?,
            author_id: row.try_get("author_id")?,
            author_username: row.try_get("author_username")?,
            text: row.try_get("text")?,
            pub_date: row.try_get("pub_date")?,
        })
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: CommentId::from_uuid(row.id),
            review_id: ReviewId::from_uuid(row.review_id),
            author: AuthorRef {
                id: UserId::from_uuid(row.author_id),
                username: row.author_username,
            },
            text: row.text,
            pub_date: row.pub_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_schema_constraint_is_mapped() {
        for name in [
            "users_username_key",
            "users_email_key",
            "reviews_title_author_key",
            "categories_slug_key",
            "genres_slug_key",
        ] {
            assert!(SCHEMA.contains(name), "{name} missing from schema");
            assert!(constraint_by_name(name).is_some(), "{name} not mapped");
        }
        assert_eq!(constraint_by_name("titles_pkey"), None);
    }

    #[test]
    fn review_constraint_is_a_review_conflict() {
        assert_eq!(
            constraint_by_name("reviews_title_author_key").map(Constraint::conflict_kind),
            Some(ConflictKind::Review)
        );
    }

    #[test]
    fn pool_closed_is_unavailable() {
        assert!(matches!(
            map_sqlx_error("test", sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
    }
}
