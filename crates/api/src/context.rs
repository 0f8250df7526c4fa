use yamdb_auth::{Actor, Principal};
use yamdb_reviews::AuthorRef;

/// The actor behind a request, as decoded from its bearer token.
///
/// Always present: requests without an `Authorization` header carry
/// `Actor::Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: Actor,
}

impl ActorContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.actor.principal()
    }

    /// How this actor is recorded as the author of new content.
    pub fn author_ref(&self) -> Option<AuthorRef> {
        self.principal().map(|p| AuthorRef {
            id: p.user_id,
            username: p.username.clone(),
        })
    }
}
