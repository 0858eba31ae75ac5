//! HTTP collaborator abstraction.
//!
//! The storefront never talks to the network directly. Every outbound call goes
//! through an [`HttpClient`] injected via the environment, which either resolves
//! with a response exposing a `data` field or rejects with an [`HttpError`].
//!
//! Callers only ever distinguish resolution from rejection; status codes are
//! the collaborator's concern.
//!
//! # Implementations
//!
//! - `ReqwestHttpClient` (in the `storefront` crate): Production implementation
//! - `MockHttpClient` (in the `storefront-testing` crate): Scripted responses for tests
//!
//! # Example
//!
//! ```no_run
//! use storefront_core::http::{HttpClient, HttpError, HttpRequest};
//!
//! async fn example<C: HttpClient>(client: &C) -> Result<(), HttpError> {
//!     let response = client
//!         .request(HttpRequest::get("/sra_products").with_query("page", "1"))
//!         .await?;
//!     println!("{}", response.data);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors a collaborator can reject with.
///
/// This is the "raw error" carried by `*_FAIL` events, so it is `Clone`,
/// comparable and serializable alongside the event.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum HttpError {
    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("Backend responded with status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// The response resolved but its payload does not have the expected shape.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// HTTP verbs used by the storefront backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        f.write_str(verb)
    }
}

/// An outbound request, relative to the collaborator's base path.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP verb
    pub method: HttpMethod,
    /// Path relative to the API base (e.g. `/sra_cart_content/`)
    pub path: String,
    /// Query parameters, in order. Keys may repeat (`coupon_codes[]`).
    pub query: Vec<(String, String)>,
    /// Optional JSON body
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Create a request with no query and no body
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET` request
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Shorthand for a `POST` request
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Shorthand for a `PUT` request
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Shorthand for a `DELETE` request
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Append a query parameter
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the JSON body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A resolved response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Decoded JSON body (`Value::Null` for an empty body)
    pub data: Value,
}

impl HttpResponse {
    /// Wrap a JSON body
    #[must_use]
    pub const fn new(data: Value) -> Self {
        Self { data }
    }
}

/// Future returned by [`HttpClient::request`]
pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Generic request/response client.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// so it can be shared as `Arc<dyn HttpClient>` inside the environment.
pub trait HttpClient: Send + Sync {
    /// Issue exactly one request.
    ///
    /// No retries and no cancellation: once issued, the request runs to
    /// resolution or rejection.
    ///
    /// # Errors
    ///
    /// Any [`HttpError`]; the caller treats every variant as a rejection.
    fn request(&self, request: HttpRequest) -> HttpFuture<'_>;
}
