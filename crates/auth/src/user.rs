//! User entity and its validation rules.
//!
//! Uniqueness of usernames and emails is a storage concern; this module owns
//! everything that can be decided without looking at other users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use yamdb_core::{DomainError, UserId, ValueObject};

use crate::{CodeDigest, Principal, Role};

const RESERVED_USERNAME: &str = "me";
const MAX_USERNAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;
const MAX_NAME_LEN: usize = 150;

// ─────────────────────────────────────────────────────────────────────────────
// Value objects
// ─────────────────────────────────────────────────────────────────────────────

/// A validated username.
///
/// Letters, digits and `@ . + - _` only; never empty; never `"me"`, which
/// would shadow the self-profile route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(DomainError::validation("username is required"));
        }
        if name == RESERVED_USERNAME {
            return Err(DomainError::validation("username 'me' is reserved"));
        }
        if name.chars().count() > MAX_USERNAME_LEN {
            return Err(DomainError::validation(format!(
                "username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err(DomainError::validation(
                "username may contain only letters, digits and @/./+/-/_",
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Username {}

impl TryFrom<String> for Username {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl core::fmt::Display for Username {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated, lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let email = raw.trim();
        if email.is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        if email.len() > MAX_EMAIL_LEN {
            return Err(DomainError::validation(format!(
                "email must be at most {MAX_EMAIL_LEN} characters"
            )));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(Self(email.to_lowercase()))
            }
            _ => Err(DomainError::validation("invalid email format")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Email {}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

fn check_name(field: &str, value: &str) -> Result<(), DomainError> {
    if value.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A registered identity.
///
/// # Invariants
/// - `username` and `email` are globally unique (enforced by storage).
/// - `role` changes only through admin updates.
/// - Users are never hard-deleted; deactivation clears `is_active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub role: Role,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    /// Digest of the outstanding confirmation code, if any.
    pub confirmation: Option<CodeDigest>,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// A plain user as created by a first signup.
    pub fn register(username: Username, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            username,
            email,
            role: Role::User,
            bio: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            confirmation: None,
            date_joined: now,
        }
    }

    pub fn from_new(new: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            role: new.role,
            bio: new.bio,
            first_name: new.first_name,
            last_name: new.last_name,
            ..Self::register(new.username, new.email, now)
        }
    }

    /// The role authorization should see, with privilege flags folded in.
    pub fn effective_role(&self) -> Role {
        Role::resolve(self.role, self.is_staff, self.is_superuser)
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            username: self.username.to_string(),
            role: self.effective_role(),
        }
    }

    /// Apply a validated self-service profile update.
    ///
    /// `ProfileUpdate` has no role field, so the role cannot change here.
    pub fn apply_profile(&mut self, update: &ProfileUpdate) {
        if let Some(bio) = &update.bio {
            self.bio = bio.clone();
        }
        if let Some(first) = &update.first_name {
            self.first_name = first.clone();
        }
        if let Some(last) = &update.last_name {
            self.last_name = last.clone();
        }
    }

    /// Apply a validated administrator's update. Email uniqueness is checked on write.
    pub fn apply_admin(&mut self, update: &AdminUpdate) {
        self.apply_profile(&update.profile);
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
        if let Some(role) = update.role {
            self.role = role;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

/// An account created directly by an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub role: Role,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_name("first_name", &self.first_name)?;
        check_name("last_name", &self.last_name)
    }
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(first) = &self.first_name {
            check_name("first_name", first)?;
        }
        if let Some(last) = &self.last_name {
            check_name("last_name", last)?;
        }
        Ok(())
    }
}

/// Fields an administrator may change on any account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminUpdate {
    pub profile: ProfileUpdate,
    pub email: Option<Email>,
    pub role: Option<Role>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
