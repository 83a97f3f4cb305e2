//! Bearer-secret authorization for internal endpoints.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::error::AppError;
use crate::state::AppState;

/// Extractor gating the internal endpoints behind
/// `Authorization: Bearer <shared-secret>`.
///
/// The header value is compared exactly against the configured shared
/// secret; anything else - missing header, wrong scheme, wrong value -
/// rejects with 401 and discloses nothing.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_subscribers(
///     _auth: RequireBearer,
///     State(state): State<AppState>,
/// ) -> Result<Json<SubscribersResponse>> {
///     // only reached with valid credentials
/// }
/// ```
pub struct RequireBearer;

impl FromRequestParts<AppState> for RequireBearer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        use secrecy::ExposeSecret;

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        if token != state.config().shared_secret.expose_secret() {
            tracing::warn!("Rejected internal request with wrong bearer credentials");
            return Err(AppError::Unauthorized);
        }

        Ok(Self)
    }
}
