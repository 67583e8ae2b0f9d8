//! HTTP client wrapper for the storefront REST API.
//!
//! # Architecture
//!
//! - [`ApiClient`] is the single chokepoint for every remote call
//! - Request interceptor: the bearer token is read from durable storage on
//!   every call and injected as `Authorization: Bearer <token>`
//! - Response interceptor: a 401 from any endpoint evicts the stored
//!   credentials and publishes [`SessionEvent::Unauthorized`]; the caller
//!   still gets [`ApiError::Unauthorized`]
//! - Every response body is an envelope `{status, data?, message?}`;
//!   `status: false` is a failure even on HTTP 200
//! - Exactly one attempt per call, no retries
//!
//! # Endpoints
//!
//! Grouped per resource in [`auth`], [`products`], [`cart`] and [`orders`].

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::ClientConfig;
use crate::events::{SessionEvent, SessionEvents};
use crate::storage::DurableStorage;

pub use auth::{ImageUpload, ProfileUpdate, RegistrationForm};
pub use cart::CartUpdate;

/// Errors that can occur when calling the storefront API.
///
/// `Display` yields a message fit for showing to the user; stores copy it
/// into their `error` field verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS).
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status other than 401.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or a generic one.
        message: String,
    },

    /// HTTP 401. Stored credentials have already been evicted.
    #[error("{0}")]
    Unauthorized(String),

    /// HTTP success with `status: false` in the envelope.
    #[error("{0}")]
    Rejected(String),

    /// Body was not the expected JSON.
    #[error("Invalid response from server: {0}")]
    Parse(#[from] serde_json::Error),

    /// Envelope reported success without a `data` payload.
    #[error("Response from server is missing data")]
    MissingData,

    /// Request path could not be joined onto the base URL.
    #[error("Invalid request URL")]
    InvalidUrl,
}

impl ApiError {
    /// HTTP status carried by this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    /// Whether the server answered 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    data: Option<T>,
    message: Option<String>,
}

/// Just the `message` of an error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Request payload.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(reqwest::multipart::Form),
}

/// A single API call.
#[derive(Debug)]
pub struct ApiRequest {
    pub method: Method,
    /// Path segments below the base URL; each is percent-encoded.
    pub path: Vec<String>,
    pub query: Vec<(&'static str, String)>,
    pub body: RequestBody,
    pub headers: HeaderMap,
}

impl ApiRequest {
    /// Request with no query, body or extra headers.
    #[must_use]
    pub fn new<I, S>(method: Method, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            path: path.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
        }
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub fn json(mut self, body: &impl serde::Serialize) -> Result<Self, ApiError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a multipart form body.
    #[must_use]
    pub fn multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Append query parameters.
    #[must_use]
    pub fn query(mut self, pairs: Vec<(&'static str, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Path joined with `/`, for logging.
    #[must_use]
    pub fn display_path(&self) -> String {
        format!("/{}", self.path.join("/"))
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; every clone shares the connection pool, storage and event
/// channel.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    storage: DurableStorage,
    events: SessionEvents,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        config: &ClientConfig,
        storage: DurableStorage,
        events: SessionEvents,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }

        // Base must end in '/' so joined segments extend its path.
        let mut base_url = config.api_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url,
                storage,
                events,
            }),
        })
    }

    /// Base URL every request is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Durable storage shared with the stores.
    #[must_use]
    pub fn storage(&self) -> &DurableStorage {
        &self.inner.storage
    }

    /// Session event channel the 401 interceptor publishes on.
    #[must_use]
    pub fn events(&self) -> &SessionEvents {
        &self.inner.events
    }

    /// Execute a request and return the envelope's `data`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, `status: false`,
    /// or a missing/unparseable payload.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send::<T>(request)
            .await?
            .data
            .ok_or(ApiError::MissingData)
    }

    /// Execute a request whose outcome is decided by the HTTP status alone.
    ///
    /// Any 2xx counts as success whatever the body says, including an empty
    /// body or `status: false`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-2xx status.
    pub async fn execute_status_only(&self, request: ApiRequest) -> Result<(), ApiError> {
        let body = self.dispatch(request).await?;
        if let Some(message) = error_message(&body) {
            tracing::debug!(message = %message, "Ignoring message on a successful status");
        }
        Ok(())
    }

    /// Execute a request whose payload is optional.
    ///
    /// A missing `data`, or one that does not match `T`, yields `None`
    /// instead of an error.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or `status: false`.
    pub async fn execute_lenient<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Option<T>, ApiError> {
        let Some(data) = self.send::<serde_json::Value>(request).await?.data else {
            return Ok(None);
        };
        Ok(serde_json::from_value(data)
            .map_err(|e| tracing::warn!(error = %e, "Ignoring unexpected response payload"))
            .ok())
    }

    async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Envelope<T>, ApiError> {
        let body = self.dispatch(request).await?;

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e)
        })?;

        if !envelope.status {
            return Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "Request was rejected".to_string()),
            ));
        }

        Ok(envelope)
    }

    /// Send `request` and return the body of a 2xx response.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.display_path()))]
    async fn dispatch(&self, request: ApiRequest) -> Result<String, ApiError> {
        let url = self.endpoint(&request)?;

        let mut builder = self
            .inner
            .client
            .request(request.method, url)
            .headers(request.headers);

        // Request interceptor: bearer token from durable storage
        if let Some(token) = self.inner.storage.token() {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Storefront API request failed");
            ApiError::Http(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        // Response interceptor: 401 tears the session down globally
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Storefront API returned 401, evicting stored credentials");
            self.inner.storage.clear_credentials();
            self.inner.events.publish(SessionEvent::Unauthorized);
            return Err(ApiError::Unauthorized(
                error_message(&body).unwrap_or_else(|| "Unauthorized".to_string()),
            ));
        }

        if !status.is_success() {
            tracing::debug!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Storefront API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_else(|| {
                    format!("Request failed with status code {}", status.as_u16())
                }),
            });
        }

        Ok(body)
    }

    fn endpoint(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl)?
            .pop_if_empty()
            .extend(&request.path);

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// `message` from a JSON error body, if there is one.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}
