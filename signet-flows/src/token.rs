//! Token endpoint plumbing.
//!
//! Every flow that mints tokens (sign-in, sign-in after sign-up, refresh)
//! funnels through [`request_token`], which performs one round-trip and splits
//! the answer into a raw [`TokenResponse`] or a [`TokenRequestError`]. The
//! split result is what the [validator](crate::validator) consumes.

use signet_core::{ClientConfiguration, RequestContext, TokenErrorResponse, TokenResponse};
use signet_transport::{ApiRequest, AuthTransport, Endpoint, TransportError};
use thiserror::Error;

/// Failure of a token endpoint round-trip.
///
/// Only the `Api` variant carries a structured token error; the validator
/// degrades the other two to its invalid-server-response case.
#[derive(Debug, Error)]
pub enum TokenRequestError {
    /// No answer was obtained at all.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a structured token error body.
    #[error("Token endpoint answered {:?}", .0.error)]
    Api(TokenErrorResponse),

    /// The answer body did not decode into the expected shape.
    #[error("Unstructured token endpoint answer (status {status})")]
    Unstructured {
        /// HTTP status of the undecodable answer.
        status: u16,
    },
}

/// Perform one token endpoint round-trip.
pub(crate) async fn request_token(
    transport: &dyn AuthTransport,
    request: ApiRequest,
    context: &RequestContext,
) -> Result<TokenResponse, TokenRequestError> {
    let response = transport.send(&request, context).await?;

    if response.is_success() {
        response.decode::<TokenResponse>().map_err(|error| {
            tracing::error!(
                correlation_id = %context.correlation_id(),
                status = response.status,
                %error,
                "Token success body did not decode"
            );
            TokenRequestError::Unstructured {
                status: response.status,
            }
        })
    } else {
        match response.decode::<TokenErrorResponse>() {
            Ok(body) => Err(TokenRequestError::Api(body)),
            Err(decode_error) => {
                tracing::error!(
                    correlation_id = %context.correlation_id(),
                    status = response.status,
                    %decode_error,
                    "Token error body did not decode"
                );
                Err(TokenRequestError::Unstructured {
                    status: response.status,
                })
            }
        }
    }
}

/// The scope value for a token call: the explicitly requested scopes, falling
/// back to the configured defaults.
fn scope_value(config: &ClientConfiguration, scopes: &[String]) -> String {
    if scopes.is_empty() {
        config.scopes_value()
    } else {
        scopes.join(" ")
    }
}

fn token_request(config: &ClientConfiguration, grant_type: &str) -> ApiRequest {
    ApiRequest::new(Endpoint::Token)
        .form("client_id", config.client_id())
        .form("grant_type", grant_type)
}

/// Redeem a password challenge.
pub(crate) fn password_grant(
    config: &ClientConfiguration,
    continuation_token: &str,
    username: &str,
    password: &str,
    scopes: &[String],
) -> ApiRequest {
    token_request(config, "password")
        .form("continuation_token", continuation_token)
        .form("username", username)
        .form("password", password)
        .form("scope", scope_value(config, scopes))
}

/// Redeem an out-of-band code challenge.
pub(crate) fn oob_grant(
    config: &ClientConfiguration,
    continuation_token: &str,
    oob: &str,
    scopes: &[String],
) -> ApiRequest {
    token_request(config, "oob")
        .form("continuation_token", continuation_token)
        .form("oob", oob)
        .form("scope", scope_value(config, scopes))
}

/// Redeem the continuation token handed out by a completed sign-up.
pub(crate) fn continuation_grant(
    config: &ClientConfiguration,
    continuation_token: &str,
    username: &str,
    scopes: &[String],
) -> ApiRequest {
    token_request(config, "continuation_token")
        .form("continuation_token", continuation_token)
        .form("username", username)
        .form("scope", scope_value(config, scopes))
}

/// Redeem a refresh token.
pub(crate) fn refresh_grant(
    config: &ClientConfiguration,
    refresh_token: &str,
    scopes: &[String],
) -> ApiRequest {
    token_request(config, "refresh_token")
        .form("refresh_token", refresh_token)
        .form("scope", scope_value(config, scopes))
}
