//! REST implementation of `StoreClient`
//!
//! Talks to a Drive-v3-shaped files API with bearer-token authentication. Error responses are
//! mapped onto `StoreError` so that rate limiting is recognizable by the retry executor and
//! discovery can classify everything else.

use crate::config::StoreConfig;
use crate::store::{ChildPage, CopyRequest, ExportFormat, Metadata, StoreClient, StoreError, StoreResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Fields requested for every document
const METADATA_FIELDS: &str = "id,name,mimeType,modifiedTime";

/// Fields requested for folder listings
const LISTING_FIELDS: &str = "nextPageToken,files(id,name,mimeType,modifiedTime)";

/// 403 reasons that mean "slow down" rather than "not allowed"
const RATE_LIMIT_REASONS: &[&str] = &["rateLimitExceeded", "userRateLimitExceeded"];

/// HTTP client for the remote document store
#[derive(Debug, Clone)]
pub struct HttpStoreClient {
    client: Client,
    api_base: Url,
    token: String,
}

impl HttpStoreClient {
    /// Builds a client for the given API base URL
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL of the files API (e.g. `https://www.googleapis.com/drive/v3`)
    /// * `token` - Bearer token sent with every request
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(HttpStoreClient)` - Ready-to-use client
    /// * `Err(StoreError)` - The base URL is invalid or the HTTP client could not be built
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> StoreResult<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| StoreError::BadRequest(format!("invalid api base {}: {}", api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(StoreError::BadRequest(format!(
                "api base {} cannot carry a path",
                api_base
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("corpus-mirror/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_base,
            token: token.to_string(),
        })
    }

    /// Builds a client from the store configuration section
    pub fn from_config(config: &StoreConfig, token: &str) -> StoreResult<Self> {
        Self::new(
            &config.api_base,
            token,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Returns `<api-base>/files[/<id>[/<suffix>]]` with every segment percent-encoded
    fn files_url(&self, id: Option<&str>, suffix: Option<&str>) -> StoreResult<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::BadRequest("api base cannot carry a path".to_string()))?;
            segments.pop_if_empty().push("files");
            if let Some(id) = id {
                segments.push(id);
            }
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    /// Sends an authenticated request and maps error statuses
    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StoreClient for HttpStoreClient {
    async fn get_metadata(&self, id: &str) -> StoreResult<Metadata> {
        let url = self.files_url(Some(id), None)?;
        let request = self
            .client
            .get(url)
            .query(&[("fields", METADATA_FIELDS), ("supportsAllDrives", "true")]);
        self.json(request).await
    }

    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> StoreResult<ChildPage> {
        let url = self.files_url(None, None)?;
        let query = format!(
            "'{}' in parents and trashed = false",
            folder_id.replace('\\', "\\\\").replace('\'', "\\'")
        );
        let page_size = page_size.to_string();

        let mut request = self.client.get(url).query(&[
            ("q", query.as_str()),
            ("pageSize", page_size.as_str()),
            ("fields", LISTING_FIELDS),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        self.json(request).await
    }

    async fn export(&self, id: &str, format: ExportFormat) -> StoreResult<String> {
        let url = self.files_url(Some(id), Some("export"))?;
        let request = self
            .client
            .get(url)
            .query(&[("mimeType", format.mime_type())]);
        self.send(request)
            .await?
            .text()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn download(&self, id: &str) -> StoreResult<Vec<u8>> {
        let url = self.files_url(Some(id), None)?;
        let request = self
            .client
            .get(url)
            .query(&[("alt", "media"), ("supportsAllDrives", "true")]);
        let bytes = self
            .send(request)
            .await?
            .bytes()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn copy(&self, id: &str, copy: &CopyRequest) -> StoreResult<Metadata> {
        let url = self.files_url(Some(id), Some("copy"))?;
        let request = self
            .client
            .post(url)
            .query(&[("fields", METADATA_FIELDS), ("supportsAllDrives", "true")])
            .json(copy);
        self.json(request).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let url = self.files_url(Some(id), None)?;
        let request = self
            .client
            .delete(url)
            .query(&[("supportsAllDrives", "true")]);
        self.send(request).await?;
        Ok(())
    }
}

/// Error envelope returned by the files API
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

/// Maps an error response onto `StoreError`
///
/// | Status | Error |
/// |--------|-------|
/// | 404 | NotFound |
/// | 400 | BadRequest |
/// | 429 | RateLimited |
/// | 403 with a rate-limit reason | RateLimited |
/// | 403 otherwise | PermissionDenied |
/// | anything else | Http |
fn classify_error(status: StatusCode, body: &str) -> StoreError {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let message = if envelope.error.message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        envelope.error.message.clone()
    };

    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::BAD_REQUEST => StoreError::BadRequest(message),
        StatusCode::TOO_MANY_REQUESTS => StoreError::RateLimited(message),
        StatusCode::FORBIDDEN => {
            let rate_limited = envelope
                .error
                .errors
                .iter()
                .any(|e| RATE_LIMIT_REASONS.contains(&e.reason.as_str()));
            if rate_limited {
                StoreError::RateLimited(message)
            } else {
                StoreError::PermissionDenied(message)
            }
        }
        other => StoreError::Http {
            status: other.as_u16(),
            message,
        },
    }
}
