//! Reviews of a title. Writes are gated on authorship; moderators and admins
//! may edit or remove anyone's review.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use yamdb_auth::{Action, AuthzError, Resource};
use yamdb_core::{ReviewId, TitleId};
use yamdb_infra::Services;

use crate::app::routes::common::parse_id;
use crate::app::extract::JsonBody;
use crate::app::{dto, errors};
use crate::authz::{authorize, authorize_new_content};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route(
            "/:review_id",
            get(get_review).patch(update_review).delete(delete_review),
        )
}

fn parse_path(title_id: &str, review_id: &str) -> Result<(TitleId, ReviewId), axum::response::Response> {
    Ok((parse_id(title_id, "title")?, parse_id(review_id, "review")?))
}

pub async fn list_reviews(
    Extension(services): Extension<Arc<Services>>,
    Path(title_id): Path<String>,
) -> axum::response::Response {
    let title_id: TitleId = match parse_id(&title_id, "title") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.ledger.list_reviews(title_id).await {
        Ok(reviews) => {
            let items = reviews.iter().map(dto::ReviewResponse::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_review(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path(title_id): Path<String>,
    JsonBody(body): JsonBody<dto::CreateReviewRequest>,
) -> axum::response::Response {
    let author = match authorize_new_content(&ctx) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let title_id: TitleId = match parse_id(&title_id, "title") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Some(score) = body.score else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "score is required");
    };

    match services
        .ledger
        .create_review(title_id, author, score, &body.text, Utc::now())
        .await
    {
        Ok(review) => (StatusCode::CREATED, Json(dto::ReviewResponse::from(&review))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_review(
    Extension(services): Extension<Arc<Services>>,
    Path((title_id, review_id)): Path<(String, String)>,
) -> axum::response::Response {
    let (title_id, review_id) = match parse_path(&title_id, &review_id) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    match services.ledger.get_review(title_id, review_id).await {
        Ok(review) => (StatusCode::OK, Json(dto::ReviewResponse::from(&review))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_review(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path((title_id, review_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<dto::UpdateReviewRequest>,
) -> axum::response::Response {
    if !ctx.actor().is_authenticated() {
        return errors::authz_error_to_response(AuthzError::Unauthenticated);
    }
    let (title_id, review_id) = match parse_path(&title_id, &review_id) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    let review = match services.ledger.get_review(title_id, review_id).await {
        Ok(r) => r,
        Err(e) => return errors::service_error_to_response(e),
    };
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Authored { author: review.author.id }) {
        return resp;
    }

    match services.ledger.update_review(review, body.text, body.score).await {
        Ok(review) => (StatusCode::OK, Json(dto::ReviewResponse::from(&review))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_review(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path((title_id, review_id)): Path<(String, String)>,
) -> axum::response::Response {
    if !ctx.actor().is_authenticated() {
        return errors::authz_error_to_response(AuthzError::Unauthenticated);
    }
    let (title_id, review_id) = match parse_path(&title_id, &review_id) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    let review = match services.ledger.get_review(title_id, review_id).await {
        Ok(r) => r,
        Err(e) => return errors::service_error_to_response(e),
    };
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Authored { author: review.author.id }) {
        return resp;
    }

    match services.ledger.delete_review(&review).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
