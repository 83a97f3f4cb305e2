//! Request extractors.

use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use serde::de::DeserializeOwned;

use crate::error::{AppError, HtmlError};

/// Extractor accepting the same payload as JSON or form-encoded body,
/// selected by the `Content-Type` header. Anything that is not JSON is
/// handed to the form parser, matching how browser form posts arrive.
///
/// # Example
///
/// ```rust,ignore
/// async fn subscribe(JsonOrForm(form): JsonOrForm<SubscribeForm>) -> impl IntoResponse {
///     // form.email regardless of how the client encoded it
/// }
/// ```
pub struct JsonOrForm<T>(pub T);

/// JSON extractor whose rejection is the usual `{"error": ...}` body
/// instead of axum's plain-text rejection, so internal endpoints fail in
/// the same shape they succeed in.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = HtmlError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if content_type.starts_with("application/json") {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        }
    }
}
