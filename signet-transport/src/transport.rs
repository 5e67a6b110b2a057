//! The transport trait and its result types.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use signet_core::RequestContext;
use thiserror::Error;

use crate::request::ApiRequest;

/// An HTTP answer, success or protocol error alike.
///
/// Non-2xx answers are not transport failures: their bodies carry the
/// structured error payloads the flow layer interprets. Only the absence of
/// any answer is a [`TransportError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl ApiResponse {
    /// Build a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body into a typed payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Failure to obtain any answer from the server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request timed out before an answer arrived.
    #[error("Request timed out")]
    Timeout,

    /// The connection could not be established or broke mid-request.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request could not be built or sent for another reason.
    #[error("Request error: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// The narrow seam the flow layer talks through.
///
/// Implementations must complete every call exactly once: one `Ok` response
/// or one `Err`, never both, never neither.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    /// Execute a request and return the raw answer.
    async fn send(
        &self,
        request: &ApiRequest,
        context: &RequestContext,
    ) -> Result<ApiResponse, TransportError>;
}
