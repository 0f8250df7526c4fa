//! API-side permission gate.
//!
//! Handlers load the target resource first, then ask the evaluator; the
//! services below never see a request they have not been allowed to run.

use axum::response::Response;

use yamdb_auth::{Action, AuthzError, Decision, Resource, evaluate};
use yamdb_reviews::AuthorRef;

use crate::app::errors;
use crate::context::ActorContext;

/// Map a permission decision onto the request: `Ok` or a 401/403 response.
pub fn authorize(ctx: &ActorContext, action: Action, resource: Resource) -> Result<(), Response> {
    match evaluate(ctx.actor(), action, &resource) {
        Decision::Allow => Ok(()),
        Decision::Deny(e) => Err(errors::authz_error_to_response(e)),
    }
}

/// Gate creation of new authored content and return its author.
pub fn authorize_new_content(ctx: &ActorContext) -> Result<AuthorRef, Response> {
    let author = ctx
        .author_ref()
        .ok_or_else(|| errors::authz_error_to_response(AuthzError::Unauthenticated))?;
    authorize(ctx, Action::Write, Resource::Authored { author: author.id })?;
    Ok(author)
}

/// Gate the caller's own profile and return its id.
pub fn authorize_profile(ctx: &ActorContext, action: Action) -> Result<yamdb_core::UserId, Response> {
    let id = ctx
        .actor()
        .user_id()
        .ok_or_else(|| errors::authz_error_to_response(AuthzError::Unauthenticated))?;
    authorize(ctx, action, Resource::Profile { subject: id })?;
    Ok(id)
}
