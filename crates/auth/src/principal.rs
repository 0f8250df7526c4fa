use serde::{Deserialize, Serialize};

use yamdb_core::UserId;

use crate::{AccessClaims, Role};

/// An authenticated identity as seen by authorization.
///
/// `role` is the snapshot taken when the access token was minted; it is not
/// re-read from storage per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

/// Whoever is making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Authenticated(Principal),
}

impl Actor {
    pub fn from_claims(claims: &AccessClaims) -> Self {
        Actor::Authenticated(Principal {
            user_id: claims.sub,
            username: claims.username.clone(),
            role: claims.role,
        })
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(p) => Some(p),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.principal().map(|p| p.user_id)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::Authenticated(_))
    }
}
