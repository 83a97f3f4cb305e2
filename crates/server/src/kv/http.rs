//! Cloudflare KV REST backend.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::KvConfig;

use super::KvError;

/// Cloudflare API base URL.
const BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Key-value client for a single Cloudflare KV namespace.
#[derive(Clone)]
pub struct HttpKvStore {
    client: reqwest::Client,
    namespace_url: String,
}

/// One entry of a key listing batch.
#[derive(Debug, Deserialize)]
struct ListedKey {
    name: String,
}

/// Cursor info attached to a key listing batch.
#[derive(Debug, Default, Deserialize)]
struct ListInfo {
    #[serde(default)]
    cursor: Option<String>,
}

/// A key listing batch.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    result: Vec<ListedKey>,
    #[serde(default)]
    result_info: Option<ListInfo>,
}

impl HttpKvStore {
    /// Create a client for the configured namespace.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the HTTP client fails to build.
    pub fn new(config: &KvConfig) -> Result<Self, KvError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value).map_err(|_| KvError::Api {
                status: 0,
                message: "API token contains invalid header characters".to_string(),
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let namespace_url = format!(
            "{BASE_URL}/accounts/{}/storage/kv/namespaces/{}",
            config.account_id, config.namespace_id
        );

        Ok(Self {
            client,
            namespace_url,
        })
    }

    /// Read a value. A 404 from the API means the key is absent.
    pub(super) async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let url = self.value_url(key);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        Ok(Some(response.text().await?))
    }

    /// Write a value, overwriting any existing one.
    pub(super) async fn put(&self, key: &str, value: &str) -> Result<(), KvError> {
        let url = self.value_url(key);
        let response = self
            .client
            .put(&url)
            .body(value.to_owned())
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            return Err(api_error(status, response).await);
        }
        Ok(())
    }

    /// Delete a key. A 404 is treated as success: delete-if-absent is a
    /// no-op.
    pub(super) async fn delete(&self, key: &str) -> Result<(), KvError> {
        let url = self.value_url(key);
        let response = self.client.delete(&url).send().await?;
        let status = response.status();

        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(api_error(status, response).await);
        }
        Ok(())
    }

    /// List all keys under `prefix`, following the pagination cursor
    /// until the API stops returning one.
    pub(super) async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        let mut keys = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/keys?prefix={}",
                self.namespace_url,
                urlencoding::encode(prefix)
            );
            if let Some(c) = &cursor {
                url.push_str("&cursor=");
                url.push_str(&urlencoding::encode(c));
            }

            let response = self.client.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(api_error(status, response).await);
            }

            let batch: ListResponse = response.json().await?;
            keys.extend(batch.result.into_iter().map(|k| k.name));

            // An absent or empty cursor marks the listing complete.
            cursor = batch
                .result_info
                .and_then(|info| info.cursor)
                .filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        Ok(keys)
    }

    fn value_url(&self, key: &str) -> String {
        format!("{}/values/{}", self.namespace_url, urlencoding::encode(key))
    }
}

/// Convert a non-success response to a typed error, keeping the body for
/// diagnosis.
async fn api_error(status: StatusCode, response: reqwest::Response) -> KvError {
    let message = response.text().await.unwrap_or_default();
    KvError::Api {
        status: status.as_u16(),
        message,
    }
}
