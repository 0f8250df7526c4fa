use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};

use yamdb_auth::AuthzError;

use crate::app::errors;
use crate::context::ActorContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<ActorContext>) -> axum::response::Response {
    let Some(principal) = ctx.principal() else {
        return errors::authz_error_to_response(AuthzError::Unauthenticated);
    };
    Json(serde_json::json!({
        "user_id": principal.user_id.to_string(),
        "username": principal.username,
        "role": principal.role.as_str(),
    }))
    .into_response()
}
