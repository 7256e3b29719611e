//! # HTTP Transport
//!
//! The [`Transport`] capability issues one request and returns the status
//! code with the raw body. The engine never talks to `reqwest` directly,
//! so tests can substitute a scripted transport and embedders can supply
//! their own stack.
//!
//! ## Request Shape
//!
//! LSD interactions carry all parameters in the query string. Request
//! bodies are always empty; POST and PUT are sent with an explicit
//! zero-length body.
//!
//! ## Timeout, Retry & Redirects
//!
//! [`HttpTransport`] uses the configured per-request timeout. There is no
//! retry: a conformance client reports each failed call exactly once.
//! Redirects are never followed; a 3xx answer reaches the engine as is.

use std::sync::Arc;

use crate::config::ClientConfig;

/// HTTP methods used by the LSD interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }
}

/// Status code and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Failure to complete an exchange. A response with any status code,
/// including 4xx/5xx, is not a transport error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The resolved link is not a usable absolute URL.
    #[error("invalid request URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No response within the configured timeout.
    #[error("{method} {url} timed out")]
    Timeout { method: HttpMethod, url: String },

    /// Connection refused, DNS failure, reset, or similar.
    #[error("{method} {url} failed: {reason}")]
    Connection {
        method: HttpMethod,
        url: String,
        reason: String,
    },

    /// The response body could not be read as text.
    #[error("failed to read response body from {url}: {reason}")]
    Body { url: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Issues one HTTP request and waits for the full response.
pub trait Transport: Send + Sync {
    fn send(&self, method: HttpMethod, url: &str) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, method: HttpMethod, url: &str) -> Result<HttpResponse, TransportError> {
        (**self).send(method, url)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, method: HttpMethod, url: &str) -> Result<HttpResponse, TransportError> {
        (**self).send(method, url)
    }
}

/// Blocking [`Transport`] over `reqwest`.
///
/// Must not be created, used, or dropped from inside an async runtime;
/// wrap calls in `spawn_blocking` there.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, method: HttpMethod, url: &str) -> Result<HttpResponse, TransportError> {
        let parsed = url::Url::parse(url).map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut request = self.client.request(method.into(), parsed);
        if method != HttpMethod::Get {
            request = request.body(Vec::<u8>::new());
        }

        let resp = request.send().map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    method,
                    url: url.to_string(),
                }
            } else {
                TransportError::Connection {
                    method,
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| TransportError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(HttpResponse { status, body })
    }
}
