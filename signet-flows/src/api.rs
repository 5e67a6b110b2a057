//! Shared round-trip handling for the non-token endpoints.
//!
//! The start/challenge/continue/submit endpoints all answer either a typed
//! success body or an [`ApiErrorResponse`]. This module performs the send and
//! splits the answer, degrading undecodable bodies to
//! [`ApiFailure::Unstructured`] so the controllers always see a typed result.

use serde::de::DeserializeOwned;
use signet_core::{ApiErrorResponse, RequestContext};
use signet_transport::{ApiRequest, AuthTransport, TransportError};

use crate::error::ErrorDescriptor;

/// Failure of a non-token endpoint round-trip.
#[derive(Debug)]
pub(crate) enum ApiFailure {
    /// No answer was obtained at all.
    Transport(TransportError),
    /// The server answered with a structured error body.
    Api(ApiErrorResponse),
    /// The answer body did not decode into the expected shape.
    Unstructured { status: u16 },
}

impl ApiFailure {
    /// Descriptor carrying whatever the server supplied about the failure.
    pub(crate) fn descriptor(&self, context: &RequestContext) -> ErrorDescriptor {
        let mut descriptor = ErrorDescriptor::new().with_correlation_id(context.correlation_id());
        if let Self::Api(error) = self {
            if let Some(message) = error.error_description.as_deref() {
                descriptor = descriptor.with_message(message);
            }
            if let Some(uri) = error.error_uri.as_deref() {
                descriptor = descriptor.with_error_uri(uri);
            }
        }
        descriptor
    }
}

/// Send a request and decode the answer into `T` or a typed failure.
pub(crate) async fn send_request<T: DeserializeOwned>(
    transport: &dyn AuthTransport,
    request: ApiRequest,
    context: &RequestContext,
) -> Result<T, ApiFailure> {
    let endpoint = request.endpoint();
    let response = match transport.send(&request, context).await {
        Ok(response) => response,
        Err(error) => {
            tracing::error!(
                correlation_id = %context.correlation_id(),
                ?endpoint,
                %error,
                "Request failed without an answer"
            );
            return Err(ApiFailure::Transport(error));
        }
    };

    if response.is_success() {
        response.decode::<T>().map_err(|error| {
            tracing::error!(
                correlation_id = %context.correlation_id(),
                ?endpoint,
                status = response.status,
                %error,
                "Success body did not decode into the expected shape"
            );
            ApiFailure::Unstructured {
                status: response.status,
            }
        })
    } else {
        match response.decode::<ApiErrorResponse>() {
            Ok(error) => Err(ApiFailure::Api(error)),
            Err(decode_error) => {
                tracing::error!(
                    correlation_id = %context.correlation_id(),
                    ?endpoint,
                    status = response.status,
                    %decode_error,
                    "Error body did not decode into the expected shape"
                );
                Err(ApiFailure::Unstructured {
                    status: response.status,
                })
            }
        }
    }
}
