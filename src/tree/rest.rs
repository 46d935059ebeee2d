//! Realtime-database tree store over its REST interface.
//!
//! Each tree path maps to `{base_url}{path}.json`:
//! - `get` → `GET` (a `null` body means absent)
//! - `set` → `PUT`
//! - `update` → `PATCH`
//! - `remove` → `DELETE`
//!
//! Authentication uses an OAuth2 access token passed as the `access_token`
//! query parameter. Minting that token from a service account is left to the
//! deployment.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use super::{validate_path, TreeStore};
use crate::error::{Result, StoreError};

/// Configuration for the REST tree client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestTreeConfig {
    /// Database root, e.g. `https://my-project-default-rtdb.firebaseio.com`
    pub base_url: String,
    /// Optional access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl RestTreeConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: None,
            timeout_secs: 30,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// REST implementation of TreeStore.
pub struct RestTree {
    base: Url,
    access_token: Option<String>,
    http: Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl RestTree {
    /// Create a client; no request is made until the first operation.
    pub fn new(config: RestTreeConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            StoreError::ConnectionError(format!("invalid base url {:?}: {}", config.base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(StoreError::ConnectionError(format!(
                "base url {:?} cannot hold a path",
                config.base_url
            )));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            base,
            access_token: config.access_token,
            http,
        })
    }

    /// URL of the JSON document at `path`, with each key percent-encoded.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        let keys = validate_path(path)?;
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::ConnectionError("base url cannot hold a path".into()))?;
            segments.pop_if_empty();
            let (last, parents) = keys
                .split_last()
                .ok_or_else(|| StoreError::InvalidKey("path has no keys".to_string()))?;
            segments.extend(parents);
            segments.push(&format!("{}.json", last));
        }
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url_for(path)?;
        debug!(%method, path, "Tree request");

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.access_token {
            request = request.query(&[("access_token", token)]);
        }
        Ok(request)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        Err(StoreError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TreeStore for RestTree {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let response = self.request(Method::GET, path)?.send().await?;
        let value: Value = Self::check(response).await?.json().await?;
        Ok(match value {
            Value::Null => None,
            value => Some(value),
        })
    }

    async fn set(&self, path: &str, value: Value) -> Result<()> {
        let response = self
            .request(Method::PUT, path)?
            .query(&[("print", "silent")])
            .json(&value)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()> {
        let response = self
            .request(Method::PATCH, path)?
            .query(&[("print", "silent")])
            .json(&fields)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let response = self.request(Method::DELETE, path)?.send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        // Shallow reads return `true` for objects instead of the whole sub-tree.
        let response = self
            .request(Method::GET, path)?
            .query(&[("shallow", "true")])
            .send()
            .await?;
        let value: Value = Self::check(response).await?.json().await?;
        Ok(!value.is_null())
    }
}
