//! Production HTTP collaborator backed by `reqwest`.

use serde_json::Value;
use storefront_core::http::{HttpClient, HttpError, HttpFuture, HttpMethod, HttpRequest, HttpResponse};

/// REST client for the storefront backend.
///
/// Paths are joined onto `base_url`. Non-2xx responses reject with
/// [`HttpError::Status`]; an empty body resolves as `null`.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ReqwestHttpClient {
    /// Create a client for `base_url` (e.g. `https://shop.example/api/4.0`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Send `token` as a bearer credential on every request
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Use a preconfigured `reqwest` client (timeouts, proxies, TLS roots)
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Base URL requests are joined onto
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

fn to_reqwest(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

impl HttpClient for ReqwestHttpClient {
    fn request(&self, request: HttpRequest) -> HttpFuture<'_> {
        Box::pin(async move {
            let url = self.url(&request.path);
            tracing::debug!(method = %request.method, %url, "Sending request");

            let mut builder = self
                .client
                .request(to_reqwest(request.method), &url)
                .query(&request.query);
            if let Some(token) = &self.token {
                builder = builder.bearer_auth(token);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| HttpError::Transport(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::Transport(e.to_string()))?;

            if !status.is_success() {
                return Err(HttpError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let data = if body.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&body).map_err(|e| HttpError::InvalidPayload(e.to_string()))?
            };
            Ok(HttpResponse::new(data))
        })
    }
}
