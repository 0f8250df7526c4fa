//! Categories, genres and titles. Titles are always served with their live rating.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use yamdb_core::TitleId;
use yamdb_reviews::{Category, Genre, NewTitle, Slug, Title};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{Store, StoreError};

/// A title together with the rating computed from its reviews right now.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedTitle {
    pub title: Title,
    pub rating: Option<f64>,
}

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn Store>,
}

impl Catalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_category(&self, name: &str, slug: &str) -> ServiceResult<Category> {
        let category = Category::create(name, Slug::parse(slug)?)?;
        self.store.insert_category(category.clone()).await?;
        info!(slug = %category.slug.as_str(), "category created");
        Ok(category)
    }

    pub async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn delete_category(&self, slug: &str) -> ServiceResult<()> {
        let slug = Slug::parse(slug)?;
        match self.store.delete_category(&slug).await {
            Err(StoreError::NotFound) => Err(ServiceError::NotFound("category")),
            other => Ok(other?),
        }
    }

    pub async fn create_genre(&self, name: &str, slug: &str) -> ServiceResult<Genre> {
        let genre = Genre::create(name, Slug::parse(slug)?)?;
        self.store.insert_genre(genre.clone()).await?;
        info!(slug = %genre.slug.as_str(), "genre created");
        Ok(genre)
    }

    pub async fn list_genres(&self) -> ServiceResult<Vec<Genre>> {
        Ok(self.store.list_genres().await?)
    }

    pub async fn delete_genre(&self, slug: &str) -> ServiceResult<()> {
        let slug = Slug::parse(slug)?;
        match self.store.delete_genre(&slug).await {
            Err(StoreError::NotFound) => Err(ServiceError::NotFound("genre")),
            other => Ok(other?),
        }
    }

    /// Create a title, resolving its category and genre slugs.
    ///
    /// Unknown slugs are a validation failure of the request, not a 404.
    pub async fn create_title(&self, new: &NewTitle, now: DateTime<Utc>) -> ServiceResult<RatedTitle> {
        let category = match &new.category {
            Some(slug) => Some(self.store.find_category(slug).await?.ok_or_else(|| {
                ServiceError::Validation(format!("unknown category '{}'", slug.as_str()))
            })?),
            None => None,
        };

        let mut genres: Vec<Genre> = Vec::with_capacity(new.genres.len());
        for slug in &new.genres {
            if genres.iter().any(|g| g.slug == *slug) {
                continue;
            }
            let genre = self.store.find_genre(slug).await?.ok_or_else(|| {
                ServiceError::Validation(format!("unknown genre '{}'", slug.as_str()))
            })?;
            genres.push(genre);
        }

        let title = Title::create(new, category, genres, now)?;
        match self.store.insert_title(title.clone()).await {
            Ok(()) => {}
            // A referenced category or genre was deleted meanwhile.
            Err(StoreError::NotFound) => {
                return Err(ServiceError::Validation(
                    "category or genre no longer exists".to_string(),
                ));
            }
            Err(other) => return Err(other.into()),
        }
        info!(title_id = %title.id, name = %title.name, "title created");
        Ok(RatedTitle {
            title,
            rating: None,
        })
    }

    pub async fn get_title(&self, id: TitleId) -> ServiceResult<RatedTitle> {
        let title = self
            .store
            .find_title(id)
            .await?
            .ok_or(ServiceError::NotFound("title"))?;
        self.rate(title).await
    }

    pub async fn list_titles(&self) -> ServiceResult<Vec<RatedTitle>> {
        let titles = self.store.list_titles().await?;
        let mut rated = Vec::with_capacity(titles.len());
        for title in titles {
            rated.push(self.rate(title).await?);
        }
        Ok(rated)
    }

    pub async fn delete_title(&self, id: TitleId) -> ServiceResult<()> {
        match self.store.delete_title(id).await {
            Ok(()) => {
                info!(title_id = %id, "title deleted with its reviews");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(ServiceError::NotFound("title")),
            Err(other) => Err(other.into()),
        }
    }

    async fn rate(&self, title: Title) -> ServiceResult<RatedTitle> {
        let rating = self.store.score_summary(title.id).await?.mean();
        Ok(RatedTitle { title, rating })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ReviewLedger;
    use crate::store::InMemoryStore;
    use yamdb_core::{ConflictKind, UserId};
    use yamdb_reviews::AuthorRef;

    fn catalog() -> (Catalog, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        (Catalog::new(store.clone()), store)
    }

    fn new_title(category: Option<&str>, genres: &[&str]) -> NewTitle {
        NewTitle {
            name: "Ivan's Childhood".to_string(),
            year: 1962,
            description: Some("war drama".to_string()),
            category: category.map(|s| Slug::parse(s).unwrap()),
            genres: genres.iter().map(|s| Slug::parse(s).unwrap()).collect(),
        }
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let (catalog, _) = catalog();
        catalog.create_category("Movies", "movie").await.unwrap();
        assert_eq!(
            catalog.create_category("Films", "movie").await.unwrap_err(),
            ServiceError::Conflict(ConflictKind::Slug)
        );
    }

    #[tokio::test]
    async fn title_resolves_slugs() {
        let (catalog, _) = catalog();
        catalog.create_category("Movies", "movie").await.unwrap();
        catalog.create_genre("Drama", "drama").await.unwrap();
        catalog.create_genre("War", "war").await.unwrap();

        let rated = catalog
            .create_title(&new_title(Some("movie"), &["war", "drama", "war"]), Utc::now())
            .await
            .unwrap();
        assert_eq!(rated.rating, None);
        assert_eq!(rated.title.category.unwrap().name, "Movies");
        assert_eq!(rated.title.genres.len(), 2);
    }

    #[tokio::test]
    async fn unknown_slug_is_a_validation_error() {
        let (catalog, _) = catalog();
        assert!(matches!(
            catalog
                .create_title(&new_title(Some("nope"), &[]), Utc::now())
                .await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            catalog.create_title(&new_title(None, &["nope"]), Utc::now()).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn title_is_served_with_live_rating() {
        let (catalog, store) = catalog();
        let ledger = ReviewLedger::new(store);
        let rated = catalog
            .create_title(&new_title(None, &[]), Utc::now())
            .await
            .unwrap();
        let id = rated.title.id;

        for score in [6, 9] {
            ledger
                .create_review(
                    id,
                    AuthorRef {
                        id: UserId::new(),
                        username: format!("critic{score}"),
                    },
                    score,
                    "noted",
                    Utc::now(),
                )
                .await
                .unwrap();
        }
        assert_eq!(catalog.get_title(id).await.unwrap().rating, Some(7.5));
        assert_eq!(catalog.list_titles().await.unwrap()[0].rating, Some(7.5));
    }

    #[tokio::test]
    async fn deleting_a_category_keeps_its_titles() {
        let (catalog, _) = catalog();
        catalog.create_category("Movies", "movie").await.unwrap();
        let rated = catalog
            .create_title(&new_title(Some("movie"), &[]), Utc::now())
            .await
            .unwrap();

        catalog.delete_category("movie").await.unwrap();
        let title = catalog.get_title(rated.title.id).await.unwrap().title;
        assert_eq!(title.category, None);
        assert_eq!(
            catalog.delete_category("movie").await.unwrap_err(),
            ServiceError::NotFound("category")
        );
    }
}
