//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>` (JSON surfaces) or
//! `Result<T, HtmlError>` (page surfaces). Both map the same taxonomy to
//! status codes; they differ only in how the body is rendered. Internal
//! details never reach the client - dependency failures are logged
//! server-side and captured to Sentry, and the client sees a generic
//! message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::kv::KvError;
use crate::notify::DispatchError;
use crate::routes::MessagePage;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing request input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or wrong bearer credentials on an internal endpoint.
    #[error("Unauthorized")]
    Unauthorized,

    /// Invalid or tampered link token.
    #[error("Forbidden: invalid link token")]
    InvalidToken,

    /// Key-value backend failure.
    #[error("Store error: {0}")]
    Store(#[from] KvError),

    /// Notification dispatch failure.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::Store(_) | Self::Dispatch(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-safe message for this error.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(message) => message.clone(),
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::InvalidToken => {
                "This link is not valid. Please use the link from your email.".to_string()
            }
            Self::Store(_) | Self::Dispatch(_) | Self::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Log server errors and capture them to Sentry.
    fn report(&self) {
        if matches!(self, Self::Store(_) | Self::Dispatch(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        let body = serde_json::json!({ "error": self.public_message() });
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for JSON handlers.
pub type Result<T> = std::result::Result<T, AppError>;

/// An [`AppError`] rendered as a templated HTML page.
///
/// HTML routes wrap their errors in this so users see the shared message
/// page instead of a JSON body.
#[derive(Debug)]
pub struct HtmlError(pub AppError);

impl From<AppError> for HtmlError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<KvError> for HtmlError {
    fn from(err: KvError) -> Self {
        Self(AppError::Store(err))
    }
}

impl From<DispatchError> for HtmlError {
    fn from(err: DispatchError) -> Self {
        Self(AppError::Dispatch(err))
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        self.0.report();
        let page = MessagePage {
            title: "Dish Digest".to_string(),
            message: self.0.public_message(),
        };
        (self.0.status(), page).into_response()
    }
}
