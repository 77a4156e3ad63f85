//! HTTP/SSE client layer for the ragchat backend.
//!
//! Every operation builds a request, awaits the response, and returns the
//! decoded payload. On failure it logs a diagnostic and propagates the error
//! unchanged: no retries, no local interpretation. Most endpoints wrap their
//! payload in [`Envelope`]; the chat module's responses are raw bodies, an
//! inconsistency preserved from the backend.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::Settings;

pub mod chat;
pub mod conversation;
pub mod document;
pub mod health;
pub mod sse;
pub mod user_setting;

pub use chat::{ConversationMessagesResponse, RawHistoryMessage};
pub use conversation::{Conversation, ConversationListResponse, CreateConversationResponse};
pub use sse::{ChatStream, ChatStreamEvent};

/// Standard response wrapper used by the non-chat endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: i32,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

/// Categories of client errors for consistent handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Non-2xx server response
    HttpStatus,
    /// Connection or request timeout
    Timeout,
    /// Network-level failure before a response arrived
    Transport,
    /// Response body could not be decoded
    Decode,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// Structured error from the API layer.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional raw response body
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, keeping the raw body as details.
    pub fn http_status(status: u16, body: &str) -> Self {
        Self {
            kind: ApiErrorKind::HttpStatus,
            message: format!("HTTP {}", status),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }

    /// Classifies a reqwest error.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::new(ApiErrorKind::Timeout, format!("Request timed out: {}", e))
        } else if e.is_connect() {
            Self::new(ApiErrorKind::Transport, format!("Connection failed: {}", e))
        } else if e.is_decode() {
            Self::decode(format!("Failed to decode response: {}", e))
        } else {
            Self::new(ApiErrorKind::Transport, format!("Network error: {}", e))
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Stateless client for the ragchat backend.
///
/// The underlying reqwest client carries no global timeout; the configured
/// timeout is applied per request so the streaming endpoint can stay open
/// indefinitely.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Creates a client for the given base URL (including the `/api` prefix).
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_base_url, settings.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Sends a request with the configured timeout and checks the status.
    pub(crate) async fn send(
        &self,
        request: reqwest::RequestBuilder,
        what: &'static str,
    ) -> Result<reqwest::Response> {
        let response = request.timeout(self.timeout).send().await.map_err(|e| {
            let err = ApiError::from_reqwest(&e);
            tracing::error!(error = %err, "{} request failed", what);
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::http_status(status.as_u16(), &body);
            tracing::error!(error = %err, "{} request failed", what);
            return Err(err.into());
        }

        Ok(response)
    }

    /// Sends a request and decodes the raw response body.
    pub(crate) async fn fetch_raw<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &'static str,
    ) -> Result<T> {
        let response = self.send(request, what).await?;
        response.json::<T>().await.map_err(|e| {
            let err = ApiError::from_reqwest(&e);
            tracing::error!(error = %err, "{} response invalid", what);
            err.into()
        })
    }

    /// Sends a request and decodes a `{code, message, data}` envelope.
    pub(crate) async fn fetch_enveloped<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &'static str,
    ) -> Result<Envelope<T>> {
        self.fetch_raw(request, what).await
    }
}
