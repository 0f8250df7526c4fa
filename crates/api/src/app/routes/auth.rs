use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;

use yamdb_infra::Services;

use crate::app::extract::JsonBody;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/token", post(token))
}

/// Create the identity or re-send its code. Answers the same either way.
pub async fn signup(
    Extension(services): Extension<Arc<Services>>,
    JsonBody(body): JsonBody<dto::SignupRequest>,
) -> axum::response::Response {
    let user = match services
        .identity
        .signup(&body.username, &body.email, Utc::now())
        .await
    {
        Ok(u) => u,
        Err(e) => return errors::service_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(dto::SignupResponse {
            username: user.username.to_string(),
            email: user.email.to_string(),
        }),
    )
        .into_response()
}

pub async fn token(
    Extension(services): Extension<Arc<Services>>,
    JsonBody(body): JsonBody<dto::TokenRequest>,
) -> axum::response::Response {
    match services
        .tokens
        .exchange(&body.username, &body.confirmation_code, Utc::now())
        .await
    {
        Ok(issued) => (
            StatusCode::OK,
            Json(dto::TokenResponse {
                token: issued.token,
            }),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
