//! Internal route handlers, gated by the bearer shared secret.
//!
//! These endpoints serve the automation around the digest: a job posts
//! the day's picks here, and the mail pipeline reads the subscriber list.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::RequireBearer;
use crate::state::AppState;

/// Response body for the subscriber listing.
#[derive(Debug, Serialize)]
pub struct SubscribersResponse {
    pub subscribers: Vec<String>,
}

/// Response body for a stored picks payload.
#[derive(Debug, Serialize)]
pub struct StorePicksResponse {
    pub success: bool,
    pub stored_date: serde_json::Value,
}

/// List every confirmed subscriber email.
///
/// Paginates through the store internally; the caller always receives
/// the full list.
#[instrument(skip_all)]
pub async fn list_subscribers(
    _auth: RequireBearer,
    State(state): State<AppState>,
) -> Result<Json<SubscribersResponse>> {
    let subscribers = state.store().subscriber_emails().await?;
    tracing::info!(count = subscribers.len(), "Listed subscribers");
    Ok(Json(SubscribersResponse { subscribers }))
}

/// Overwrite the day's picks.
///
/// Requires `date_str` and `meals` to be present; the nested structure is
/// not validated and the payload is stored verbatim.
#[instrument(skip_all)]
pub async fn store_picks(
    _auth: RequireBearer,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<serde_json::Value>,
) -> Result<Json<StorePicksResponse>> {
    if payload.get("date_str").is_none() || payload.get("meals").is_none() {
        return Err(AppError::BadRequest(
            "Payload must include date_str and meals.".to_string(),
        ));
    }

    state.store().put_latest_picks(&payload).await?;

    let stored_date = payload
        .get("date_str")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    tracing::info!(stored_date = %stored_date, "Stored picks");

    Ok(Json(StorePicksResponse {
        success: true,
        stored_date,
    }))
}
