use yamdb_core::UserId;

/// What the actor wants to do.
///
/// `Read` covers the safe methods (GET/HEAD/OPTIONS); everything else is a
/// `Write`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
}

impl Action {
    pub fn is_safe(self) -> bool {
        self == Action::Read
    }
}

/// The target of an action, carrying only what authorization needs to know
/// about ownership.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Categories, genres and titles.
    Catalog,
    /// A review or a comment, identified by its author.
    Authored { author: UserId },
    /// A user's own profile (`/users/me`).
    Profile { subject: UserId },
    /// Administration of arbitrary accounts (listing, creating, role changes).
    Accounts,
}

/// Resource kind with the ownership data stripped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Catalog,
    Authored,
    Profile,
    Accounts,
}

impl Resource {
    pub fn scope(&self) -> Scope {
        match self {
            Resource::Catalog => Scope::Catalog,
            Resource::Authored { .. } => Scope::Authored,
            Resource::Profile { .. } => Scope::Profile,
            Resource::Accounts => Scope::Accounts,
        }
    }

    /// The user that owns this resource, if ownership is meaningful for it.
    pub fn owner(&self) -> Option<UserId> {
        match self {
            Resource::Authored { author } => Some(*author),
            Resource::Profile { subject } => Some(*subject),
            Resource::Catalog | Resource::Accounts => None,
        }
    }
}
