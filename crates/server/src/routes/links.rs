//! Signed-link route handlers: confirm and unsubscribe.
//!
//! Both endpoints are reached from emailed links carrying `email` and
//! `token` query parameters. The token authorizes the action without any
//! server-side session state; the subscription lifecycle is implicit in
//! record existence:
//!
//! ```text
//! unknown -> subscribe (token emailed, no record)
//!         -> confirm with valid token (record exists)
//!         -> unsubscribe with valid token (unknown again)
//! ```

use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use dish_digest_core::Email;

use crate::error::{AppError, HtmlError};
use crate::state::AppState;
use crate::token;

use super::MessagePage;

/// Query parameters carried by emailed links.
///
/// Both fields optional so a missing parameter is our 400, not a
/// framework rejection.
#[derive(Debug, Deserialize)]
pub struct LinkParams {
    pub email: Option<String>,
    pub token: Option<String>,
}

/// Confirm a subscription.
///
/// Writes the subscriber record on first confirm; a repeat confirm with
/// the same valid token succeeds idempotently.
#[instrument(skip(state, params))]
pub async fn confirm(
    State(state): State<AppState>,
    Query(params): Query<LinkParams>,
) -> Result<MessagePage, HtmlError> {
    let email = authorize_link(&state, &params)?;

    if state.store().is_subscribed(&email).await? {
        tracing::info!(email = %email, "Confirm repeated for existing subscriber");
        return Ok(MessagePage {
            title: "Already subscribed".to_string(),
            message: "You're already subscribed to the digest.".to_string(),
        });
    }

    state.store().add_subscriber(&email).await?;
    tracing::info!(email = %email, "Subscription confirmed");

    Ok(MessagePage {
        title: "Subscription confirmed".to_string(),
        message: "You're in! The daily digest will land in your inbox.".to_string(),
    })
}

/// Unsubscribe.
///
/// Deletes the record unconditionally - removing an absent record is a
/// no-op - and reports success regardless of prior existence.
#[instrument(skip(state, params))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Query(params): Query<LinkParams>,
) -> Result<MessagePage, HtmlError> {
    let email = authorize_link(&state, &params)?;

    state.store().remove_subscriber(&email).await?;
    tracing::info!(email = %email, "Unsubscribed");

    Ok(MessagePage {
        title: "Unsubscribed".to_string(),
        message: "You've been unsubscribed. Sorry to see you go!".to_string(),
    })
}

/// Validate link parameters and verify the token against the normalized
/// email.
///
/// The email is normalized by `Email::parse` exactly as it was at signing
/// time, so a link for `Jane@Cornell.edu` verifies when presented as
/// `jane@cornell.edu`.
fn authorize_link(state: &AppState, params: &LinkParams) -> Result<Email, HtmlError> {
    let (Some(raw_email), Some(candidate)) = (&params.email, &params.token) else {
        return Err(AppError::BadRequest("This link is missing information.".to_string()).into());
    };

    let email = Email::parse(raw_email)
        .map_err(|_| AppError::BadRequest("This link carries an invalid address.".to_string()))?;

    if !token::verify(&state.config().shared_secret, email.as_str(), candidate) {
        tracing::warn!(email = %email, "Rejected link with invalid token");
        return Err(AppError::InvalidToken.into());
    }

    Ok(email)
}
