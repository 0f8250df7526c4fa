//! Catalogue entities that reviews attach to.

use chrono::{Datelike, DateTime, Utc};
use serde::{Deserialize, Serialize};

use yamdb_core::{CategoryId, DomainError, GenreId, TitleId, ValueObject};

use crate::require_text;

const MAX_SLUG_LEN: usize = 50;
const MAX_NAME_LEN: usize = 256;

/// URL-safe identifier for categories and genres.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let slug = raw.trim();
        if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
            return Err(DomainError::validation(format!(
                "slug must be 1 to {MAX_SLUG_LEN} characters"
            )));
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::validation(
                "slug may contain only ASCII letters, digits, '-' and '_'",
            ));
        }
        Ok(Self(slug.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Slug {}

impl TryFrom<String> for Slug {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(value: Slug) -> Self {
        value.0
    }
}

fn parse_name(raw: &str) -> Result<String, DomainError> {
    let name = require_text("name", raw)?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    #[serde(skip)]
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
}

impl Category {
    pub fn create(name: &str, slug: Slug) -> Result<Self, DomainError> {
        Ok(Self {
            id: CategoryId::new(),
            name: parse_name(name)?,
            slug,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Genre {
    #[serde(skip)]
    pub id: GenreId,
    pub name: String,
    pub slug: Slug,
}

impl Genre {
    pub fn create(name: &str, slug: Slug) -> Result<Self, DomainError> {
        Ok(Self {
            id: GenreId::new(),
            name: parse_name(name)?,
            slug,
        })
    }
}

/// A catalogued work. Its rating is derived from reviews, never stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub id: TitleId,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub genres: Vec<Genre>,
}

impl Title {
    /// Build a title from validated input and already-resolved references.
    pub fn create(
        new: &NewTitle,
        category: Option<Category>,
        genres: Vec<Genre>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if new.year > now.year() {
            return Err(DomainError::validation(format!(
                "year {} is in the future",
                new.year
            )));
        }
        Ok(Self {
            id: TitleId::new(),
            name: parse_name(&new.name)?,
            year: new.year,
            description: new
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            category,
            genres,
        })
    }
}

/// Input for creating a title; references are by slug.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTitle {
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<Slug>,
    #[serde(default, rename = "genre")]
    pub genres: Vec<Slug>,
}
