use thiserror::Error;

use yamdb_core::UserId;

use crate::{Action, Actor, Resource, Role, Scope};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(&'static str),
}

/// Outcome of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(AuthzError),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Everything the evaluator knows about the actor relative to one resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Capability {
    pub authenticated: bool,
    pub role: Role,
    pub is_owner: bool,
}

impl Capability {
    pub const ANONYMOUS: Capability = Capability {
        authenticated: false,
        role: Role::User,
        is_owner: false,
    };

    pub fn of(actor: &Actor, owner: Option<UserId>) -> Self {
        match actor {
            Actor::Anonymous => Self::ANONYMOUS,
            Actor::Authenticated(p) => Capability {
                authenticated: true,
                role: p.role,
                is_owner: owner == Some(p.user_id),
            },
        }
    }
}

/// Decide whether `cap` may perform `action` within `scope`.
///
/// - No IO
/// - No panics
/// - Account administration is admin-only for every action, reads included
/// - Profiles are only reachable by their owner
/// - Catalog and authored content are readable by anyone
pub fn decide(cap: Capability, action: Action, scope: Scope) -> Decision {
    match scope {
        Scope::Accounts => require_role(cap, Role::Admin, "admin role required"),
        Scope::Profile => {
            if !cap.authenticated {
                Decision::Deny(AuthzError::Unauthenticated)
            } else if cap.is_owner {
                Decision::Allow
            } else {
                Decision::Deny(AuthzError::Forbidden("profile belongs to another user"))
            }
        }
        Scope::Catalog if action.is_safe() => Decision::Allow,
        Scope::Catalog => require_role(cap, Role::Admin, "admin role required"),
        Scope::Authored if action.is_safe() => Decision::Allow,
        Scope::Authored => {
            if !cap.authenticated {
                Decision::Deny(AuthzError::Unauthenticated)
            } else if cap.is_owner || cap.role.at_least(Role::Moderator) {
                Decision::Allow
            } else {
                Decision::Deny(AuthzError::Forbidden(
                    "only the author or a moderator may modify this",
                ))
            }
        }
    }
}

/// Evaluate an action against a concrete resource.
pub fn evaluate(actor: &Actor, action: Action, resource: &Resource) -> Decision {
    let cap = Capability::of(actor, resource.owner());
    let decision = decide(cap, action, resource.scope());
    if let Decision::Deny(reason) = &decision {
        tracing::debug!(
            user_id = ?actor.user_id(),
            ?action,
            scope = ?resource.scope(),
            %reason,
            "permission denied"
        );
    }
    decision
}

fn require_role(cap: Capability, min: Role, msg: &'static str) -> Decision {
    if !cap.authenticated {
        Decision::Deny(AuthzError::Unauthenticated)
    } else if cap.role.at_least(min) {
        Decision::Allow
    } else {
        Decision::Deny(AuthzError::Forbidden(msg))
    }
}
