//! Categories and genres: public reads, admin writes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};

use yamdb_auth::{Action, Resource};
use yamdb_infra::Services;

use crate::app::extract::JsonBody;
use crate::app::{dto, errors};
use crate::authz::authorize;
use crate::context::ActorContext;

pub fn categories_router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:slug", delete(delete_category))
}

pub fn genres_router() -> Router {
    Router::new()
        .route("/", get(list_genres).post(create_genre))
        .route("/:slug", delete(delete_genre))
}

fn items(list: Vec<dto::SluggedResponse>) -> axum::response::Response {
    (StatusCode::OK, Json(serde_json::json!({ "items": list }))).into_response()
}

pub async fn list_categories(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Read, Resource::Catalog) {
        return resp;
    }
    match services.catalog.list_categories().await {
        Ok(list) => items(list.iter().map(dto::SluggedResponse::from).collect()),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_category(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    JsonBody(body): JsonBody<dto::CreateSluggedRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Catalog) {
        return resp;
    }
    match services.catalog.create_category(&body.name, &body.slug).await {
        Ok(c) => (StatusCode::CREATED, Json(dto::SluggedResponse::from(&c))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(slug): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Catalog) {
        return resp;
    }
    match services.catalog.delete_category(&slug).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_genres(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Read, Resource::Catalog) {
        return resp;
    }
    match services.catalog.list_genres().await {
        Ok(list) => items(list.iter().map(dto::SluggedResponse::from).collect()),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_genre(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    JsonBody(body): JsonBody<dto::CreateSluggedRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Catalog) {
        return resp;
    }
    match services.catalog.create_genre(&body.name, &body.slug).await {
        Ok(g) => (StatusCode::CREATED, Json(dto::SluggedResponse::from(&g))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_genre(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(slug): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Catalog) {
        return resp;
    }
    match services.catalog.delete_genre(&slug).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
