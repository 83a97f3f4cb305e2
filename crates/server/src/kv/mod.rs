//! Key-value store adapter.
//!
//! Durability is delegated to an external key-value store exposing get,
//! put, delete, and prefix listing with an opaque pagination cursor. This
//! module wraps that capability behind [`KvStore`]: a Cloudflare Workers
//! KV namespace over its REST API in production, an in-memory map for
//! local development and tests.
//!
//! Each operation is independently atomic at the backend's granularity
//! with last-writer-wins semantics. No transactions, no compare-and-swap,
//! and no cross-key consistency: a listing taken concurrently with a
//! write may or may not reflect it.

pub mod http;
pub mod memory;

use thiserror::Error;

pub use http::HttpKvStore;
pub use memory::MemoryKvStore;

/// Errors from the key-value backend.
#[derive(Debug, Error)]
pub enum KvError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("KV API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// A key-value store backend.
///
/// Enum dispatch rather than a trait object: the two backends are known
/// at compile time and the variants stay cheaply cloneable.
#[derive(Clone)]
pub enum KvStore {
    /// Cloudflare KV over REST.
    Http(HttpKvStore),
    /// In-memory map (local dev, tests).
    Memory(MemoryKvStore),
}

impl KvStore {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the backend call fails. A missing key is
    /// `Ok(None)`, not an error.
    pub async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        match self {
            Self::Http(store) => store.get(key).await,
            Self::Memory(store) => Ok(store.get(key).await),
        }
    }

    /// Write `value` under `key`, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the backend call fails.
    pub async fn put(&self, key: &str, value: &str) -> Result<(), KvError> {
        match self {
            Self::Http(store) => store.put(key, value).await,
            Self::Memory(store) => {
                store.put(key, value).await;
                Ok(())
            }
        }
    }

    /// Delete `key`. Deleting an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the backend call fails.
    pub async fn delete(&self, key: &str) -> Result<(), KvError> {
        match self {
            Self::Http(store) => store.delete(key).await,
            Self::Memory(store) => {
                store.delete(key).await;
                Ok(())
            }
        }
    }

    /// List every key starting with `prefix`.
    ///
    /// Pagination is internal: batches are fetched with the backend's
    /// opaque cursor until it signals completion, and the full key set is
    /// returned. Callers never see the cursor.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if any batch fetch fails.
    pub async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        match self {
            Self::Http(store) => store.list_keys(prefix).await,
            Self::Memory(store) => Ok(store.list_keys(prefix).await),
        }
    }
}
