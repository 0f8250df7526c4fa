//! Domain error model.

use serde::Serialize;
use thiserror::Error;

/// Which uniqueness rule a write collided with.
///
/// Surfaced to clients so they can tell a taken username apart from a taken
/// email or a second review of the same title.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Username,
    Email,
    Review,
    Slug,
}

impl ConflictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictKind::Username => "username",
            ConflictKind::Email => "email",
            ConflictKind::Review => "review",
            ConflictKind::Slug => "slug",
        }
    }
}

impl core::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// uniqueness, missing parents). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A uniqueness rule was violated.
    #[error("conflict: {0} already taken")]
    Conflict(ConflictKind),

    /// A referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(kind: ConflictKind) -> Self {
        Self::Conflict(kind)
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound(what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_the_field() {
        let err = DomainError::conflict(ConflictKind::Email);
        assert_eq!(err.to_string(), "conflict: email already taken");
    }

    #[test]
    fn not_found_message_names_the_resource() {
        assert_eq!(DomainError::not_found("title").to_string(), "title not found");
    }
}
