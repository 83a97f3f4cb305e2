//! Subscription start route handler.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use dish_digest_core::Email;

use crate::error::{AppError, HtmlError};
use crate::extract::JsonOrForm;
use crate::state::AppState;
use crate::token;

use super::MessagePage;

/// Subscription form data, accepted as form-encoded or JSON body.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    pub email: String,
}

/// Start a subscription.
///
/// Nothing is persisted here: the subscriber record is created only when
/// the emailed link is confirmed, so pending state lives entirely in the
/// token. If a confirmed record already exists the request succeeds
/// idempotently without dispatching another email.
#[instrument(skip(state, form))]
pub async fn subscribe(
    State(state): State<AppState>,
    JsonOrForm(form): JsonOrForm<SubscribeForm>,
) -> Result<MessagePage, HtmlError> {
    let email = Email::parse(&form.email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address.".to_string()))?;

    if state.store().is_subscribed(&email).await? {
        tracing::info!(email = %email, "Already subscribed");
        return Ok(MessagePage {
            title: "Already subscribed".to_string(),
            message: "You're already subscribed to the digest.".to_string(),
        });
    }

    let confirm_url = build_confirm_url(&state, &email);
    state
        .dispatcher()
        .send_verification(&email, &confirm_url)
        .await?;

    tracing::info!(email = %email, "Verification email dispatched");
    Ok(MessagePage {
        title: "Check your inbox".to_string(),
        message: "Almost there! Check your inbox for a confirmation link.".to_string(),
    })
}

/// Build the confirmation URL on this service's own origin.
fn build_confirm_url(state: &AppState, email: &Email) -> String {
    let signed = token::sign(&state.config().shared_secret, email.as_str());

    let mut url = state.config().base_url.clone();
    url.set_path("/api/confirm");
    url.query_pairs_mut()
        .append_pair("email", email.as_str())
        .append_pair("token", &signed);
    url.to_string()
}
