//! Notification dispatcher.
//!
//! The service never composes or sends email. It signals intent to an
//! external automation pipeline, passing exactly two fields: the
//! recipient address and the confirmation URL. The pipeline owns the
//! email content and delivery.
//!
//! The production backend fires a GitHub `repository_dispatch` event; an
//! in-memory backend records requests for local development and tests.
//! The provider shape lives entirely in this module so the handlers only
//! ever see `send_verification(email, confirm_url)`.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use tokio::sync::Mutex;

use dish_digest_core::Email;

use crate::config::DispatchConfig;

/// GitHub REST API base URL.
const BASE_URL: &str = "https://api.github.com";

/// `repository_dispatch` event type the mail pipeline listens for.
const EVENT_TYPE: &str = "send_verification";

/// Errors that can occur when triggering a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Dispatch endpoint returned a non-success response.
    #[error("dispatch API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// A verification email handed off to the external pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub email: Email,
    pub confirm_url: String,
}

/// Verification email dispatcher.
#[derive(Clone)]
pub enum Dispatcher {
    /// Fire a GitHub `repository_dispatch` event.
    Github(GithubDispatcher),
    /// Record requests in memory (local dev, tests).
    Memory(MemoryDispatcher),
}

impl Dispatcher {
    /// Hand off a verification email for `email` carrying `confirm_url`.
    ///
    /// Not retried: the caller surfaces failure to the user, who can
    /// simply submit the form again.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError` if the outbound call fails or the endpoint
    /// answers with a non-success status.
    pub async fn send_verification(
        &self,
        email: &Email,
        confirm_url: &str,
    ) -> Result<(), DispatchError> {
        match self {
            Self::Github(dispatcher) => dispatcher.send_verification(email, confirm_url).await,
            Self::Memory(dispatcher) => {
                dispatcher.send_verification(email, confirm_url).await;
                Ok(())
            }
        }
    }
}

/// GitHub `repository_dispatch` client.
#[derive(Clone)]
pub struct GithubDispatcher {
    client: reqwest::Client,
    owner: String,
    repo: String,
}

impl GithubDispatcher {
    /// Create a dispatcher for the configured repository.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError` if the HTTP client fails to build.
    pub fn new(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.token.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value).map_err(|_| DispatchError::Api {
                status: 0,
                message: "dispatch token contains invalid header characters".to_string(),
            })?,
        );
        headers.insert("Accept", HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        // GitHub rejects requests without a User-Agent
        headers.insert("User-Agent", HeaderValue::from_static("dish-digest"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        })
    }

    async fn send_verification(
        &self,
        email: &Email,
        confirm_url: &str,
    ) -> Result<(), DispatchError> {
        let url = format!("{BASE_URL}/repos/{}/{}/dispatches", self.owner, self.repo);

        let body = serde_json::json!({
            "event_type": EVENT_TYPE,
            "client_payload": {
                "email": email,
                "confirm_url": confirm_url,
            }
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        // GitHub answers 204 No Content on success
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %message,
                "Verification dispatch failed"
            );
            return Err(DispatchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Dispatcher that records requests instead of sending them.
///
/// Logs each confirm URL at info level so a local subscribe flow can be
/// completed by hand. Clones share the same request log.
#[derive(Clone, Default)]
pub struct MemoryDispatcher {
    sent: Arc<Mutex<Vec<VerificationRequest>>>,
}

impl MemoryDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn send_verification(&self, email: &Email, confirm_url: &str) {
        tracing::info!(email = %email, confirm_url = %confirm_url, "Recorded verification dispatch");
        self.sent.lock().await.push(VerificationRequest {
            email: email.clone(),
            confirm_url: confirm_url.to_owned(),
        });
    }

    /// Requests recorded so far, in order.
    pub async fn sent(&self) -> Vec<VerificationRequest> {
        self.sent.lock().await.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_dispatcher_records_in_order() {
        let dispatcher = MemoryDispatcher::new();
        let jane = Email::parse("jane@cornell.edu").unwrap();
        let john = Email::parse("john@cornell.edu").unwrap();

        dispatcher.send_verification(&jane, "http://x/confirm?1").await;
        dispatcher.send_verification(&john, "http://x/confirm?2").await;

        let sent = dispatcher.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].email, jane);
        assert_eq!(sent[1].confirm_url, "http://x/confirm?2");
    }

    #[tokio::test]
    async fn test_memory_dispatcher_clones_share_log() {
        let dispatcher = MemoryDispatcher::new();
        let clone = dispatcher.clone();
        let jane = Email::parse("jane@cornell.edu").unwrap();

        Dispatcher::Memory(clone)
            .send_verification(&jane, "http://x/confirm")
            .await
            .unwrap();

        assert_eq!(dispatcher.sent().await.len(), 1);
    }
}
