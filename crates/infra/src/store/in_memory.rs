use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use yamdb_auth::{AdminUpdate, CodeDigest, Email, ProfileUpdate, Role, User, Username};
use yamdb_core::{CommentId, ConflictKind, ReviewId, TitleId, UserId};
use yamdb_reviews::{Category, Comment, Genre, Review, ScoreSummary, Slug, Title};

use super::{
    CatalogStore, CommentStore, Constraint, ReviewStore, SignupOutcome, StoreError, StoreResult,
    UserStore,
};

#[derive(Debug, Default)]
struct UserTable {
    by_id: HashMap<UserId, User>,
    by_username: HashMap<Username, UserId>,
    by_email: HashMap<Email, UserId>,
}

impl UserTable {
    fn claim(&self, user: &User) -> Result<(), Constraint> {
        if let Some(owner) = self.by_username.get(&user.username) {
            if *owner != user.id {
                return Err(Constraint::Username);
            }
        }
        if let Some(owner) = self.by_email.get(&user.email) {
            if *owner != user.id {
                return Err(Constraint::Email);
            }
        }
        Ok(())
    }

    /// Change the stored user in place, keeping the indexes in step.
    fn modify(&mut self, id: UserId, change: impl FnOnce(&mut User)) -> StoreResult<User> {
        let mut next = self.by_id.get(&id).cloned().ok_or(StoreError::NotFound)?;
        change(&mut next);
        self.claim(&next).map_err(StoreError::UniqueViolation)?;
        self.put(next.clone());
        Ok(next)
    }

    fn put(&mut self, user: User) {
        if let Some(previous) = self.by_id.get(&user.id) {
            // Email is the only unique field that may change.
            self.by_email.remove(&previous.email);
        }
        self.by_username.insert(user.username.clone(), user.id);
        self.by_email.insert(user.email.clone(), user.id);
        self.by_id.insert(user.id, user);
    }
}

#[derive(Debug, Default)]
struct CatalogTable {
    categories: BTreeMap<String, Category>,
    genres: BTreeMap<String, Genre>,
    titles: HashMap<TitleId, Title>,
}

#[derive(Debug, Default)]
struct ReviewTable {
    by_id: HashMap<ReviewId, Review>,
    by_pair: HashMap<(TitleId, UserId), ReviewId>,
}

impl ReviewTable {
    fn remove(&mut self, id: ReviewId) -> Option<Review> {
        let review = self.by_id.remove(&id)?;
        self.by_pair.remove(&(review.title_id, review.author.id));
        Some(review)
    }
}

/// In-memory implementation of every store trait.
///
/// Intended for tests/dev. Each table has its own lock; operations that span
/// tables acquire them in the order catalog, reviews, comments so that a
/// cascade never interleaves with an insert into a dying parent.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<UserTable>,
    catalog: RwLock<CatalogTable>,
    reviews: RwLock<ReviewTable>,
    comments: RwLock<HashMap<CommentId, Comment>>,
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

/// Oldest first; ids break ties within the same instant.
fn by_date<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, uuid::Uuid)) {
    items.sort_by_key(key);
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(read(&self.users)?.by_id.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> StoreResult<Option<User>> {
        let users = read(&self.users)?;
        Ok(users
            .by_username
            .get(username)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        let users = read(&self.users)?;
        Ok(users
            .by_email
            .get(email)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn list_users(&self, search: Option<&str>) -> StoreResult<Vec<User>> {
        let needle = search.map(str::to_lowercase);
        let users = read(&self.users)?;
        let mut found: Vec<User> = users
            .by_id
            .values()
            .filter(|u| match &needle {
                Some(n) => u.username.as_str().to_lowercase().contains(n.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.as_str().cmp(b.username.as_str()));
        Ok(found)
    }

    async fn signup(&self, candidate: User, code: CodeDigest) -> StoreResult<SignupOutcome> {
        let mut users = write(&self.users)?;

        let by_name = users.by_username.get(&candidate.username).copied();
        let by_email = users.by_email.get(&candidate.email).copied();

        match (by_name, by_email) {
            (None, None) => {
                let mut user = candidate;
                user.confirmation = Some(code);
                users.put(user.clone());
                Ok(SignupOutcome::Created(user))
            }
            (Some(a), Some(b)) if a == b => {
                let user = users
                    .by_id
                    .get_mut(&a)
                    .ok_or_else(|| StoreError::Unavailable("user index out of sync".to_string()))?;
                user.confirmation = Some(code);
                Ok(SignupOutcome::Refreshed(user.clone()))
            }
            (Some(_), _) => Ok(SignupOutcome::Conflict(ConflictKind::Username)),
            (None, Some(_)) => Ok(SignupOutcome::Conflict(ConflictKind::Email)),
        }
    }

    async fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut users = write(&self.users)?;
        if users.by_id.contains_key(&user.id) {
            return Err(StoreError::Unavailable(format!("duplicate user id {}", user.id)));
        }
        users.claim(&user).map_err(StoreError::UniqueViolation)?;
        users.put(user);
        Ok(())
    }

    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> StoreResult<User> {
        write(&self.users)?.modify(id, |user| user.apply_profile(update))
    }

    async fn admin_update(&self, id: UserId, update: &AdminUpdate) -> StoreResult<(User, Role)> {
        let mut users = write(&self.users)?;
        let previous = users.by_id.get(&id).map(|u| u.role).ok_or(StoreError::NotFound)?;
        let user = users.modify(id, |user| user.apply_admin(update))?;
        Ok((user, previous))
    }

    async fn set_active(&self, id: UserId, active: bool) -> StoreResult<bool> {
        let mut users = write(&self.users)?;
        let user = users.by_id.get_mut(&id).ok_or(StoreError::NotFound)?;
        if user.is_active == active {
            return Ok(false);
        }
        user.is_active = active;
        Ok(true)
    }

    async fn promote_superuser(&self, id: UserId) -> StoreResult<User> {
        write(&self.users)?.modify(id, |user| {
            user.role = Role::Admin;
            user.is_staff = true;
            user.is_superuser = true;
            user.is_active = true;
        })
    }

    async fn consume_code(&self, id: UserId, code: &CodeDigest) -> StoreResult<bool> {
        let mut users = write(&self.users)?;
        let Some(user) = users.by_id.get_mut(&id) else {
            return Ok(false);
        };
        if user.confirmation.as_ref() == Some(code) {
            user.confirmation = None;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalogue
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_category(&self, category: Category) -> StoreResult<()> {
        let mut catalog = write(&self.catalog)?;
        let key = category.slug.as_str().to_string();
        if catalog.categories.contains_key(&key) {
            return Err(StoreError::UniqueViolation(Constraint::CategorySlug));
        }
        catalog.categories.insert(key, category);
        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(read(&self.catalog)?.categories.values().cloned().collect())
    }

    async fn find_category(&self, slug: &Slug) -> StoreResult<Option<Category>> {
        Ok(read(&self.catalog)?.categories.get(slug.as_str()).cloned())
    }

    async fn delete_category(&self, slug: &Slug) -> StoreResult<()> {
        let mut catalog = write(&self.catalog)?;
        catalog
            .categories
            .remove(slug.as_str())
            .ok_or(StoreError::NotFound)?;
        for title in catalog.titles.values_mut() {
            if title.category.as_ref().is_some_and(|c| c.slug == *slug) {
                title.category = None;
            }
        }
        Ok(())
    }

    async fn insert_genre(&self, genre: Genre) -> StoreResult<()> {
        let mut catalog = write(&self.catalog)?;
        let key = genre.slug.as_str().to_string();
        if catalog.genres.contains_key(&key) {
            return Err(StoreError::UniqueViolation(Constraint::GenreSlug));
        }
        catalog.genres.insert(key, genre);
        Ok(())
    }

    async fn list_genres(&self) -> StoreResult<Vec<Genre>> {
        Ok(read(&self.catalog)?.genres.values().cloned().collect())
    }

    async fn find_genre(&self, slug: &Slug) -> StoreResult<Option<Genre>> {
        Ok(read(&self.catalog)?.genres.get(slug.as_str()).cloned())
    }

    async fn delete_genre(&self, slug: &Slug) -> StoreResult<()> {
        let mut catalog = write(&self.catalog)?;
        catalog
            .genres
            .remove(slug.as_str())
            .ok_or(StoreError::NotFound)?;
        for title in catalog.titles.values_mut() {
            title.genres.retain(|g| g.slug != *slug);
        }
        Ok(())
    }

    async fn insert_title(&self, title: Title) -> StoreResult<()> {
        let mut catalog = write(&self.catalog)?;
        let category_gone = title
            .category
            .as_ref()
            .is_some_and(|c| !catalog.categories.contains_key(c.slug.as_str()));
        let genre_gone = title
            .genres
            .iter()
            .any(|g| !catalog.genres.contains_key(g.slug.as_str()));
        if category_gone || genre_gone {
            return Err(StoreError::NotFound);
        }
        catalog.titles.insert(title.id, title);
        Ok(())
    }

    async fn find_title(&self, id: TitleId) -> StoreResult<Option<Title>> {
        Ok(read(&self.catalog)?.titles.get(&id).cloned())
    }

    async fn list_titles(&self) -> StoreResult<Vec<Title>> {
        let mut titles: Vec<Title> = read(&self.catalog)?.titles.values().cloned().collect();
        titles.sort_by_key(|t| *t.id.as_uuid());
        Ok(titles)
    }

    async fn delete_title(&self, id: TitleId) -> StoreResult<()> {
        let mut catalog = write(&self.catalog)?;
        let mut reviews = write(&self.reviews)?;
        let mut comments = write(&self.comments)?;

        catalog.titles.remove(&id).ok_or(StoreError::NotFound)?;

        let doomed: Vec<ReviewId> = reviews
            .by_id
            .values()
            .filter(|r| r.title_id == id)
            .map(|r| r.id)
            .collect();
        for review_id in &doomed {
            reviews.remove(*review_id);
        }
        comments.retain(|_, c| !doomed.contains(&c.review_id));
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reviews and comments
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn insert_review(&self, review: Review) -> StoreResult<()> {
        // Held for the whole insert so the title cannot be deleted under us.
        let catalog = read(&self.catalog)?;
        if !catalog.titles.contains_key(&review.title_id) {
            return Err(StoreError::NotFound);
        }

        let mut reviews = write(&self.reviews)?;
        let pair = (review.title_id, review.author.id);
        if reviews.by_pair.contains_key(&pair) {
            return Err(StoreError::UniqueViolation(Constraint::ReviewTitleAuthor));
        }
        reviews.by_pair.insert(pair, review.id);
        reviews.by_id.insert(review.id, review);
        Ok(())
    }

    async fn find_review(&self, title_id: TitleId, id: ReviewId) -> StoreResult<Option<Review>> {
        Ok(read(&self.reviews)?
            .by_id
            .get(&id)
            .filter(|r| r.title_id == title_id)
            .cloned())
    }

    async fn list_reviews(&self, title_id: TitleId) -> StoreResult<Vec<Review>> {
        let mut found: Vec<Review> = read(&self.reviews)?
            .by_id
            .values()
            .filter(|r| r.title_id == title_id)
            .cloned()
            .collect();
        by_date(&mut found, |r| (r.pub_date, *r.id.as_uuid()));
        Ok(found)
    }

    async fn update_review(&self, review: &Review) -> StoreResult<()> {
        let mut reviews = write(&self.reviews)?;
        let stored = reviews
            .by_id
            .get_mut(&review.id)
            .filter(|r| r.title_id == review.title_id)
            .ok_or(StoreError::NotFound)?;
        stored.text = review.text.clone();
        stored.score = review.score;
        Ok(())
    }

    async fn delete_review(&self, title_id: TitleId, id: ReviewId) -> StoreResult<()> {
        let mut reviews = write(&self.reviews)?;
        let mut comments = write(&self.comments)?;

        if !reviews.by_id.get(&id).is_some_and(|r| r.title_id == title_id) {
            return Err(StoreError::NotFound);
        }
        reviews.remove(id);
        comments.retain(|_, c| c.review_id != id);
        Ok(())
    }

    async fn score_summary(&self, title_id: TitleId) -> StoreResult<ScoreSummary> {
        let reviews = read(&self.reviews)?;
        Ok(ScoreSummary::from_scores(
            reviews
                .by_id
                .values()
                .filter(|r| r.title_id == title_id)
                .map(|r| r.score),
        ))
    }
}

#[async_trait]
impl CommentStore for InMemoryStore {
    async fn insert_comment(&self, comment: Comment) -> StoreResult<()> {
        let reviews = read(&self.reviews)?;
        if !reviews.by_id.contains_key(&comment.review_id) {
            return Err(StoreError::NotFound);
        }
        write(&self.comments)?.insert(comment.id, comment);
        Ok(())
    }

    async fn find_comment(&self, review_id: ReviewId, id: CommentId) -> StoreResult<Option<Comment>> {
        Ok(read(&self.comments)?
            .get(&id)
            .filter(|c| c.review_id == review_id)
            .cloned())
    }

    async fn list_comments(&self, review_id: ReviewId) -> StoreResult<Vec<Comment>> {
        let mut found: Vec<Comment> = read(&self.comments)?
            .values()
            .filter(|c| c.review_id == review_id)
            .cloned()
            .collect();
        by_date(&mut found, |c| (c.pub_date, *c.id.as_uuid()));
        Ok(found)
    }

    async fn update_comment(&self, comment: &Comment) -> StoreResult<()> {
        let mut comments = write(&self.comments)?;
        let stored = comments
            .get_mut(&comment.id)
            .filter(|c| c.review_id == comment.review_id)
            .ok_or(StoreError::NotFound)?;
        stored.text = comment.text.clone();
        Ok(())
    }

    async fn delete_comment(&self, review_id: ReviewId, id: CommentId) -> StoreResult<()> {
        let mut comments = write(&self.comments)?;
        if !comments.get(&id).is_some_and(|c| c.review_id == review_id) {
            return Err(StoreError::NotFound);
        }
        comments.remove(&id);
        Ok(())
    }
}
