//! Subscriber and picks storage on top of the key-value adapter.
//!
//! # Key layout
//!
//! - `sub:<normalized-email>` → `{"subscribedAt": "<ISO-8601>"}`
//! - `latest_picks` → the day's picks payload (singleton, fully
//!   overwritten on every write, never deleted)

use dish_digest_core::{DailyPicks, Email, SubscriberRecord};

use crate::kv::{KvError, KvStore};

/// Prefix namespacing subscriber records.
const SUBSCRIBER_PREFIX: &str = "sub:";

/// Key of the singleton picks record.
const LATEST_PICKS_KEY: &str = "latest_picks";

/// Domain-level store for subscriber records and the picks singleton.
#[derive(Clone)]
pub struct DigestStore {
    kv: KvStore,
}

impl DigestStore {
    /// Wrap a key-value backend.
    #[must_use]
    pub const fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Whether a confirmed subscription record exists for `email`.
    ///
    /// Record existence is the whole check; the value is not inspected.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the backend call fails.
    pub async fn is_subscribed(&self, email: &Email) -> Result<bool, KvError> {
        let value = self.kv.get(&subscriber_key(email)).await?;
        Ok(value.is_some())
    }

    /// Write the subscription record for `email`, stamped with the
    /// current time. Overwrites any existing record; concurrent confirms
    /// converge on the same result.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the backend call fails.
    pub async fn add_subscriber(&self, email: &Email) -> Result<(), KvError> {
        let record = SubscriberRecord::now();
        let value =
            serde_json::to_string(&record).expect("subscriber record serialization is infallible");
        self.kv.put(&subscriber_key(email), &value).await
    }

    /// Delete the subscription record for `email`. Deleting an absent
    /// record is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the backend call fails.
    pub async fn remove_subscriber(&self, email: &Email) -> Result<(), KvError> {
        self.kv.delete(&subscriber_key(email)).await
    }

    /// List every confirmed subscriber email, prefix stripped.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the backend call fails.
    pub async fn subscriber_emails(&self) -> Result<Vec<String>, KvError> {
        let keys = self.kv.list_keys(SUBSCRIBER_PREFIX).await?;
        Ok(keys
            .into_iter()
            .filter_map(|key| {
                key.strip_prefix(SUBSCRIBER_PREFIX)
                    .map(std::borrow::ToOwned::to_owned)
            })
            .collect())
    }

    /// Overwrite the singleton picks record with `payload`, verbatim.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the backend call fails.
    pub async fn put_latest_picks(&self, payload: &serde_json::Value) -> Result<(), KvError> {
        self.kv
            .put(LATEST_PICKS_KEY, &payload.to_string())
            .await
    }

    /// Read the singleton picks record.
    ///
    /// Lenient on shape: a stored payload that no longer matches the
    /// expected structure logs a warning and reads as absent rather than
    /// failing the caller.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the backend call fails.
    pub async fn latest_picks(&self) -> Result<Option<DailyPicks>, KvError> {
        let Some(raw) = self.kv.get(LATEST_PICKS_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(picks) => Ok(Some(picks)),
            Err(e) => {
                tracing::warn!(error = %e, "Stored picks payload is malformed, rendering without it");
                Ok(None)
            }
        }
    }
}

/// Build the record key for an email.
fn subscriber_key(email: &Email) -> String {
    format!("{SUBSCRIBER_PREFIX}{email}")
}
