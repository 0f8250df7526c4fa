use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use yamdb_auth::{Action, ProfileUpdate, Resource};
use yamdb_infra::Services;

use crate::app::routes::common::parse_username;
use crate::app::extract::JsonBody;
use crate::app::{dto, errors};
use crate::authz::{authorize, authorize_profile};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(get_me).patch(update_me))
        .route(
            "/:username",
            get(get_user).patch(update_user).delete(deactivate_user),
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// Own profile
// ─────────────────────────────────────────────────────────────────────────────

pub async fn get_me(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    let id = match authorize_profile(&ctx, Action::Read) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.identity.profile(id).await {
        Ok(user) => (StatusCode::OK, Json(dto::UserResponse::from(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `role` in the body is ignored: `ProfileUpdate` has no such field.
pub async fn update_me(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    JsonBody(body): JsonBody<ProfileUpdate>,
) -> axum::response::Response {
    let id = match authorize_profile(&ctx, Action::Write) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.identity.update_profile(id, &body).await {
        Ok(user) => (StatusCode::OK, Json(dto::UserResponse::from(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Account administration
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list_users(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Query(query): Query<dto::UserSearchQuery>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Read, Resource::Accounts) {
        return resp;
    }
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match services.identity.list(search).await {
        Ok(users) => {
            let items = users.iter().map(dto::UserResponse::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    JsonBody(body): JsonBody<dto::CreateUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Accounts) {
        return resp;
    }
    let new = match body.into_new_user() {
        Ok(n) => n,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.identity.create(new, Utc::now()).await {
        Ok(user) => (StatusCode::CREATED, Json(dto::UserResponse::from(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(username): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Read, Resource::Accounts) {
        return resp;
    }
    let username = match parse_username(&username) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match services.identity.get(&username).await {
        Ok(user) => (StatusCode::OK, Json(dto::UserResponse::from(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(username): Path<String>,
    JsonBody(body): JsonBody<dto::AdminUpdateRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Accounts) {
        return resp;
    }
    let username = match parse_username(&username) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let update = match body.into_update() {
        Ok(u) => u,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.identity.admin_update(&username, &update).await {
        Ok(user) => (StatusCode::OK, Json(dto::UserResponse::from(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Accounts are never removed; they stop being able to sign in.
pub async fn deactivate_user(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(username): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Accounts) {
        return resp;
    }
    let username = match parse_username(&username) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match services.identity.deactivate(&username).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
