//! Mock transport for tests.
//!
//! [`MockTransport`] answers requests from a configured queue and records
//! every request it sees, so flow tests can assert both the outcomes and the
//! wire traffic that produced them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use signet_core::RequestContext;

use crate::request::ApiRequest;
use crate::transport::{ApiResponse, AuthTransport, TransportError};

type QueuedAnswer = Result<ApiResponse, TransportError>;

/// An [`AuthTransport`] driven by queued answers.
///
/// # Example
///
/// ```rust
/// use signet_transport::{ApiRequest, AuthTransport, Endpoint, MockTransport};
/// use signet_core::RequestContext;
///
/// # tokio_test::block_on(async {
/// let transport = MockTransport::new()
///     .with_json(200, r#"{"continuation_token":"ct-1"}"#);
///
/// let request = ApiRequest::new(Endpoint::SignInInitiate).form("username", "u");
/// let response = transport.send(&request, &RequestContext::new()).await.unwrap();
/// assert!(response.body.contains("ct-1"));
/// assert_eq!(transport.recorded_requests().len(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    answers: Arc<Mutex<VecDeque<QueuedAnswer>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    /// Create a transport with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw answer.
    #[must_use]
    pub fn with_answer(self, answer: QueuedAnswer) -> Self {
        self.answers.lock().unwrap().push_back(answer);
        self
    }

    /// Queue a JSON response with the given status.
    #[must_use]
    pub fn with_json(self, status: u16, body: impl Into<String>) -> Self {
        self.with_answer(Ok(ApiResponse::new(status, body)))
    }

    /// Queue a transport failure.
    #[must_use]
    pub fn with_error(self, error: TransportError) -> Self {
        self.with_answer(Err(error))
    }

    /// The requests seen so far, in order.
    #[must_use]
    pub fn recorded_requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of answers still queued.
    #[must_use]
    pub fn remaining_answers(&self) -> usize {
        self.answers.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthTransport for MockTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        _context: &RequestContext,
    ) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Connection(
                    "mock transport queue is empty".to_string(),
                ))
            })
    }
}
