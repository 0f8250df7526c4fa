use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use yamdb_auth::{AdminUpdate, Email, NewUser, ProfileUpdate, Role, User, Username};
use yamdb_core::DomainError;
use yamdb_infra::RatedTitle;
use yamdb_reviews::{Category, Comment, Genre, NewTitle, Review, Slug};

// -------------------------
// Request DTOs
// -------------------------
//
// Fields default to empty so that missing input reaches domain validation
// and comes back as a 400 naming the field.

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub confirmation_code: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl CreateUserRequest {
    pub fn into_new_user(self) -> Result<NewUser, DomainError> {
        Ok(NewUser {
            username: Username::parse(&self.username)?,
            email: Email::parse(&self.email)?,
            role: parse_role(self.role.as_deref())?.unwrap_or_default(),
            bio: self.bio,
            first_name: self.first_name,
            last_name: self.last_name,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateRequest {
    pub email: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl AdminUpdateRequest {
    pub fn into_update(self) -> Result<AdminUpdate, DomainError> {
        Ok(AdminUpdate {
            profile: ProfileUpdate {
                bio: self.bio,
                first_name: self.first_name,
                last_name: self.last_name,
            },
            email: self.email.as_deref().map(Email::parse).transpose()?,
            role: parse_role(self.role.as_deref())?,
        })
    }
}

fn parse_role(raw: Option<&str>) -> Result<Option<Role>, DomainError> {
    raw.map(|r| {
        r.parse::<Role>()
            .map_err(|e| DomainError::validation(e.to_string()))
    })
    .transpose()
}

#[derive(Debug, Deserialize)]
pub struct CreateSluggedRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTitleRequest {
    #[serde(default)]
    pub name: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
}

impl CreateTitleRequest {
    pub fn into_new_title(self) -> Result<NewTitle, DomainError> {
        Ok(NewTitle {
            name: self.name,
            year: self
                .year
                .ok_or_else(|| DomainError::validation("year is required"))?,
            description: self.description,
            category: self.category.as_deref().map(Slug::parse).transpose()?,
            genres: self
                .genre
                .iter()
                .map(|s| Slug::parse(s))
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub text: String,
    pub score: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReviewRequest {
    pub text: Option<String>,
    pub score: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCommentRequest {
    pub text: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.to_string(),
            email: user.email.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone(),
            role: user.effective_role(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SluggedResponse {
    pub name: String,
    pub slug: String,
}

impl From<&Category> for SluggedResponse {
    fn from(c: &Category) -> Self {
        Self {
            name: c.name.clone(),
            slug: c.slug.as_str().to_string(),
        }
    }
}

impl From<&Genre> for SluggedResponse {
    fn from(g: &Genre) -> Self {
        Self {
            name: g.name.clone(),
            slug: g.slug.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TitleResponse {
    pub id: String,
    pub name: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub genre: Vec<SluggedResponse>,
    pub category: Option<SluggedResponse>,
}

impl From<&RatedTitle> for TitleResponse {
    fn from(rated: &RatedTitle) -> Self {
        let t = &rated.title;
        Self {
            id: t.id.to_string(),
            name: t.name.clone(),
            year: t.year,
            rating: rated.rating,
            description: t.description.clone(),
            genre: t.genres.iter().map(SluggedResponse::from).collect(),
            category: t.category.as_ref().map(SluggedResponse::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub text: String,
    pub author: String,
    pub score: u8,
    pub pub_date: DateTime<Utc>,
}

impl From<&Review> for ReviewResponse {
    fn from(r: &Review) -> Self {
        Self {
            id: r.id.to_string(),
            text: r.text.clone(),
            author: r.author.username.clone(),
            score: r.score.get(),
            pub_date: r.pub_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub text: String,
    pub author: String,
    pub pub_date: DateTime<Utc>,
}

impl From<&Comment> for CommentResponse {
    fn from(c: &Comment) -> Self {
        Self {
            id: c.id.to_string(),
            text: c.text.clone(),
            author: c.author.username.clone(),
            pub_date: c.pub_date,
        }
    }
}
