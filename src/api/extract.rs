//! Request body extraction with the crate's error shape.

use crate::errors::Error;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

/// `Json<T>` whose rejections become [`Error::Validation`].
///
/// Malformed bodies, missing fields and a wrong content type all answer with
/// the same `{"success": false, "message": ...}` body as every other 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(Error::validation(rejection.body_text())),
        }
    }
}
