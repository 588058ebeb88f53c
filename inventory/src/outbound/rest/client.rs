//! Reqwest-backed PostgREST client.
//!
//! This client owns transport details only: authentication headers, request
//! serialisation, timeout and HTTP error mapping, and JSON decoding. Each
//! terminal operation issues exactly one request and never retries.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::query::TableQuery;
use crate::domain::ports::InventoryStoreError;

/// Request timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised by [`RestClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestClientError {
    /// The request never produced a response.
    #[error("transport failure: {message}")]
    Transport {
        /// Underlying error text.
        message: String,
    },
    /// The request exceeded its deadline.
    #[error("request timed out: {message}")]
    Timeout {
        /// Underlying error text.
        message: String,
    },
    /// The server answered with a non-success status.
    #[error("status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Compacted body preview.
        message: String,
    },
    /// The response body was not the expected JSON.
    #[error("invalid response payload: {message}")]
    Decode {
        /// Decoder error text.
        message: String,
    },
    /// The request body or headers could not be encoded.
    #[error("invalid request payload: {message}")]
    Encode {
        /// Encoder error text.
        message: String,
    },
    /// The endpoint URL could not be built.
    #[error("invalid endpoint: {message}")]
    InvalidUrl {
        /// Reason the URL was rejected.
        message: String,
    },
}

impl RestClientError {
    pub(crate) fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: message.into(),
        }
    }

    fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

impl From<RestClientError> for InventoryStoreError {
    fn from(error: RestClientError) -> Self {
        match error {
            RestClientError::Transport { .. } | RestClientError::Timeout { .. } => {
                Self::connection(error.to_string())
            }
            RestClientError::Decode { .. } => Self::decode(error.to_string()),
            RestClientError::Status { .. }
            | RestClientError::Encode { .. }
            | RestClientError::InvalidUrl { .. } => Self::query(error.to_string()),
        }
    }
}

/// Connection settings for one PostgREST project.
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    /// Project URL; tables live under `<base_url>/rest/v1/`.
    pub base_url: Url,
    /// Access key sent as `apikey` and as the bearer token.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RestClientConfig {
    /// Settings with the default timeout.
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Client for the PostgREST tabular API.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: Url,
}

impl RestClient {
    /// Build a client whose requests all carry the access-key headers.
    ///
    /// # Errors
    ///
    /// [`RestClientError::Encode`] when the key is not a valid header value,
    /// [`RestClientError::Transport`] when the reqwest client cannot be
    /// constructed.
    pub fn new(config: RestClientConfig) -> Result<Self, RestClientError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers(&config.api_key)?)
            .build()
            .map_err(map_transport_error)?;
        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Project URL requests are issued against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET` rows matching `query`.
    ///
    /// # Errors
    ///
    /// [`RestClientError::InvalidUrl`] when the request URL cannot be built,
    /// [`RestClientError::Transport`] or [`RestClientError::Timeout`] when
    /// the request does not complete, [`RestClientError::Status`] for a
    /// non-success response and [`RestClientError::Decode`] when the body is
    /// not a row array.
    pub async fn fetch<T>(&self, query: &TableQuery) -> Result<Vec<T>, RestClientError>
    where
        T: DeserializeOwned,
    {
        let url = query.read_url(&self.base_url)?;
        let body = self.send(Method::GET, url, None).await?;
        decode_rows(&body)
    }

    /// `POST` one or more rows and return them as stored.
    ///
    /// # Errors
    ///
    /// [`RestClientError::Encode`] when `rows` cannot be serialised,
    /// otherwise as [`Self::fetch`].
    pub async fn insert<B, T>(
        &self,
        query: &TableQuery,
        rows: &[B],
    ) -> Result<Vec<T>, RestClientError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = query.insert_url(&self.base_url)?;
        let body = self.send(Method::POST, url, Some(encode_body(rows)?)).await?;
        decode_rows(&body)
    }

    /// `PATCH` rows matching the query's filters with `patch`.
    ///
    /// # Errors
    ///
    /// As [`Self::insert`].
    pub async fn update<B, T>(
        &self,
        query: &TableQuery,
        patch: &B,
    ) -> Result<Vec<T>, RestClientError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = query.mutation_url(&self.base_url)?;
        let body = self.send(Method::PATCH, url, Some(encode_body(patch)?)).await?;
        decode_rows(&body)
    }

    /// `DELETE` rows matching the query's filters.
    ///
    /// # Errors
    ///
    /// As [`Self::fetch`]; the response body is not decoded.
    pub async fn delete(&self, query: &TableQuery) -> Result<(), RestClientError> {
        let url = query.mutation_url(&self.base_url)?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        payload: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, RestClientError> {
        debug!(%method, %url, "postgrest request");
        let mut request = self.http.request(method, url);
        if let Some(payload) = payload {
            request = request.body(payload);
        }
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

fn default_headers(api_key: &str) -> Result<HeaderMap, RestClientError> {
    let key = HeaderValue::from_str(api_key)
        .map_err(|_| RestClientError::encode("access key is not a valid header value"))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|_| RestClientError::encode("access key is not a valid header value"))?;

    let mut headers = HeaderMap::new();
    headers.insert("apikey", key);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("prefer", HeaderValue::from_static("return=representation"));
    Ok(headers)
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>, RestClientError> {
    serde_json::to_vec(body).map_err(|err| RestClientError::encode(err.to_string()))
}

fn decode_rows<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, RestClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(body).map_err(|err| RestClientError::decode(err.to_string()))
}

fn map_transport_error(error: reqwest::Error) -> RestClientError {
    if error.is_timeout() {
        RestClientError::Timeout {
            message: error.to_string(),
        }
    } else {
        RestClientError::Transport {
            message: error.to_string(),
        }
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RestClientError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    } else {
        preview
    };
    RestClientError::Status {
        status: status.as_u16(),
        message,
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
