//! Subscriber record type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The value stored for a confirmed subscriber.
///
/// The record is keyed by the normalized email address and its existence
/// is the sole signal of a confirmed subscription - there is no separate
/// "pending" state. The record is created on confirm, never mutated, and
/// deleted on unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberRecord {
    /// When the subscription was confirmed (ISO-8601).
    #[serde(rename = "subscribedAt")]
    pub subscribed_at: DateTime<Utc>,
}

impl SubscriberRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            subscribed_at: Utc::now(),
        }
    }
}
