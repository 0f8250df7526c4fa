//! Request extractors with the API's error shape.

use axum::{
    Json, async_trait,
    extract::{FromRequest, Request},
    response::Response,
};
use serde::de::DeserializeOwned;

use crate::app::errors;

/// `Json<T>` whose rejections (bad syntax, wrong field types, missing
/// content type) answer `400 validation_error` instead of axum's 415/422.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(errors::json_rejection_to_response(rejection)),
        }
    }
}
