use axum::{Router, routing::get};

pub mod auth;
pub mod catalog;
pub mod comments;
pub mod common;
pub mod reviews;
pub mod system;
pub mod titles;
pub mod users;

/// Router for every endpoint that sees an actor (anonymous or authenticated).
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/categories", catalog::categories_router())
        .nest("/genres", catalog::genres_router())
        .nest("/titles", titles::router())
        .nest("/titles/:title_id/reviews", reviews::router())
        .nest(
            "/titles/:title_id/reviews/:review_id/comments",
            comments::router(),
        )
}
