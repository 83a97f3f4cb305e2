//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::DigestConfig;
use crate::kv::{KvError, KvStore, MemoryKvStore};
use crate::notify::{DispatchError, Dispatcher, GithubDispatcher, MemoryDispatcher};
use crate::store::DigestStore;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("key-value client: {0}")]
    Kv(#[from] KvError),
    #[error("dispatch client: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the configuration, the digest
/// store, and the notification dispatcher - handlers reach external
/// capabilities only through here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DigestConfig,
    store: DigestStore,
    dispatcher: Dispatcher,
}

impl AppState {
    /// Build state from configuration, selecting backends based on what
    /// is configured: the Cloudflare KV REST client and GitHub dispatcher
    /// when credentials are present, in-memory stand-ins otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured HTTP client fails to build.
    pub fn from_config(config: DigestConfig) -> Result<Self, StateError> {
        let kv = match &config.kv {
            Some(kv_config) => KvStore::Http(crate::kv::HttpKvStore::new(kv_config)?),
            None => {
                tracing::warn!("KV credentials not configured, using in-memory store");
                KvStore::Memory(MemoryKvStore::new())
            }
        };

        let dispatcher = match &config.dispatch {
            Some(dispatch_config) => Dispatcher::Github(GithubDispatcher::new(dispatch_config)?),
            None => {
                tracing::warn!(
                    "Dispatch target not configured, verification emails will only be logged"
                );
                Dispatcher::Memory(MemoryDispatcher::new())
            }
        };

        Ok(Self::with_parts(config, DigestStore::new(kv), dispatcher))
    }

    /// Assemble state from explicit parts. Tests use this to inject the
    /// in-memory store and capture dispatcher.
    #[must_use]
    pub fn with_parts(config: DigestConfig, store: DigestStore, dispatcher: Dispatcher) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                dispatcher,
            }),
        }
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &DigestConfig {
        &self.inner.config
    }

    /// Get a reference to the digest store.
    #[must_use]
    pub fn store(&self) -> &DigestStore {
        &self.inner.store
    }

    /// Get a reference to the notification dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }
}
