//! Comments on a review, gated like reviews.

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
use yamdb_core::{CommentId, ReviewId, TitleId};
use yamdb_infra::Services;

use crate::app::routes::common::parse_id;
use crate::app::extract::JsonBody;
use crate::app::{dto, errors};
use crate::authz::{authorize, authorize_new_content};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route(
            "/:comment_id",
            get(get_comment).patch(update_comment).delete(delete_comment),
        )
}

type Parent = (TitleId, ReviewId);

fn parse_parent(title_id: &str, review_id: &str) -> Result<Parent, axum::response::Response> {
    Ok((parse_id(title_id, "title")?, parse_id(review_id, "review")?))
}

fn parse_full(
    title_id: &str,
    review_id: &str,
    comment_id: &str,
) -> Result<(TitleId, ReviewId, CommentId), axum::response::Response> {
    let (t, r) = parse_parent(title_id, review_id)?;
    Ok((t, r, parse_id(comment_id, "comment")?))
}

pub async fn list_comments(
    Extension(services): Extension<Arc<Services>>,
    Path((title_id, review_id)): Path<(String, String)>,
) -> axum::response::Response {
    let (title_id, review_id) = match parse_parent(&title_id, &review_id) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    match services.comments.list(title_id, review_id).await {
        Ok(comments) => {
            let items = comments.iter().map(dto::CommentResponse::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_comment(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path((title_id, review_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<dto::CreateCommentRequest>,
) -> axum::response::Response {
    let author = match authorize_new_content(&ctx) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let (title_id, review_id) = match parse_parent(&title_id, &review_id) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    match services
        .comments
        .create(title_id, review_id, author, &body.text, Utc::now())
        .await
    {
        Ok(c) => (StatusCode::CREATED, Json(dto::CommentResponse::from(&c))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_comment(
    Extension(services): Extension<Arc<Services>>,
    Path((title_id, review_id, comment_id)): Path<(String, String, String)>,
) -> axum::response::Response {
    let (title_id, review_id, comment_id) = match parse_full(&title_id, &review_id, &comment_id) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    match services.comments.get(title_id, review_id, comment_id).await {
        Ok(c) => (StatusCode::OK, Json(dto::CommentResponse::from(&c))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_comment(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path((title_id, review_id, comment_id)): Path<(String, String, String)>,
    JsonBody(body): JsonBody<dto::UpdateCommentRequest>,
) -> axum::response::Response {
    if !ctx.actor().is_authenticated() {
        return errors::authz_error_to_response(AuthzError::Unauthenticated);
    }
    let (title_id, review_id, comment_id) = match parse_full(&title_id, &review_id, &comment_id) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    let comment = match services.comments.get(title_id, review_id, comment_id).await {
        Ok(c) => c,
        Err(e) => return errors::service_error_to_response(e),
    };
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Authored { author: comment.author.id }) {
        return resp;
    }
    match services.comments.update(comment, body.text).await {
        Ok(c) => (StatusCode::OK, Json(dto::CommentResponse::from(&c))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_comment(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<ActorContext>,
    Path((title_id, review_id, comment_id)): Path<(String, String, String)>,
) -> axum::response::Response {
    if !ctx.actor().is_authenticated() {
        return errors::authz_error_to_response(AuthzError::Unauthenticated);
    }
    let (title_id, review_id, comment_id) = match parse_full(&title_id, &review_id, &comment_id) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    let comment = match services.comments.get(title_id, review_id, comment_id).await {
        Ok(c) => c,
        Err(e) => return errors::service_error_to_response(e),
    };
    if let Err(resp) = authorize(&ctx, Action::Write, Resource::Authored { author: comment.author.id }) {
        return resp;
    }
    match services.comments.delete(&comment).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
