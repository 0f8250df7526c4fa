use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use yamdb_auth::{Action, Resource};
use yamdb_core::TitleId;
use yamdb_infra::Services;

use crate::app::routes::common::parse_id;
use crate::app::extract::JsonBody;
use crate::app::{dto, errors};
use crate::authz::authorize;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_titles).post(create_title))
        .route("/:title_id", get(get_title).delete(delete_title))
}

pub async fn list_titles(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Read, Resource::Catalog) {
        return resp;
    }
    match services.catalog.list_titles().await {
        Ok(titles) => {
            let items = titles.iter().map(dto::TitleResponse::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_title(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    JsonBody(body): JsonBody<dto::CreateTitleRequest>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Catalog) {
        return resp;
    }
    let new = match body.into_new_title() {
        Ok(n) => n,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.catalog.create_title(&new, Utc::now()).await {
        Ok(title) => (StatusCode::CREATED, Json(dto::TitleResponse::from(&title))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_title(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(title_id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Read, Resource::Catalog) {
        return resp;
    }
    let title_id: TitleId = match parse_id(&title_id, "title") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.catalog.get_title(title_id).await {
        Ok(title) => (StatusCode::OK, Json(dto::TitleResponse::from(&title))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Reviews and their comments go with the title.
pub async fn delete_title(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(title_id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Catalog) {
        return resp;
    }
    let title_id: TitleId = match parse_id(&title_id, "title") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.catalog.delete_title(title_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
