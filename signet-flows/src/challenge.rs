//! Shared interpretation of challenge endpoint answers.
//!
//! Sign-in, sign-up, and reset-password all ask their challenge endpoint which
//! credential the server wants next. The answer shapes are identical across
//! the three flows, so the classification lives here.

use signet_core::{ChallengeResponse, ClientConfiguration, RequestContext};
use signet_transport::{ApiRequest, AuthTransport, Endpoint};

use crate::api::{self, ApiFailure};
use crate::state::ChallengeChannel;

/// What the challenge endpoint asked for.
#[derive(Debug)]
pub(crate) enum ChallengeOutcome {
    /// The server demands a browser redirect.
    Redirect,
    /// A one-time code was sent out of band.
    OobSent {
        continuation_token: String,
        sent_to: String,
        channel: ChallengeChannel,
        code_length: u32,
    },
    /// The server selected the password challenge.
    PasswordRequired { continuation_token: String },
    /// The answer did not carry a usable challenge.
    Unexpected,
}

/// Ask a challenge endpoint which credential the server wants next.
pub(crate) async fn request_challenge(
    transport: &dyn AuthTransport,
    config: &ClientConfiguration,
    endpoint: Endpoint,
    continuation_token: &str,
    context: &RequestContext,
) -> Result<ChallengeOutcome, ApiFailure> {
    let request = ApiRequest::new(endpoint)
        .form("client_id", config.client_id())
        .form("challenge_type", config.challenge_types_value())
        .form("continuation_token", continuation_token);

    let response: ChallengeResponse = api::send_request(transport, request, context).await?;
    Ok(interpret(&response, context))
}

fn interpret(response: &ChallengeResponse, context: &RequestContext) -> ChallengeOutcome {
    if response.is_redirect() {
        return ChallengeOutcome::Redirect;
    }

    match response.challenge_type.as_deref() {
        Some("oob") => {
            let (Some(continuation_token), Some(sent_to), Some(code_length)) = (
                response.continuation_token.clone(),
                response.challenge_target_label.clone(),
                response.code_length,
            ) else {
                tracing::error!(
                    correlation_id = %context.correlation_id(),
                    "oob challenge answer is missing required fields"
                );
                return ChallengeOutcome::Unexpected;
            };
            ChallengeOutcome::OobSent {
                continuation_token,
                sent_to,
                channel: ChallengeChannel::from_wire(response.challenge_channel.as_deref()),
                code_length,
            }
        }
        Some("password") => match response.continuation_token.clone() {
            Some(continuation_token) => ChallengeOutcome::PasswordRequired { continuation_token },
            None => {
                tracing::error!(
                    correlation_id = %context.correlation_id(),
                    "password challenge answer carries no continuation token"
                );
                ChallengeOutcome::Unexpected
            }
        },
        other => {
            tracing::error!(
                correlation_id = %context.correlation_id(),
                challenge_type = ?other,
                "Unknown challenge type in answer"
            );
            ChallengeOutcome::Unexpected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_transport::MockTransport;

    fn config() -> ClientConfiguration {
        ClientConfiguration::new("client-1", "https://contoso.ciamlogin.com/contoso").unwrap()
    }

    #[tokio::test]
    async fn test_oob_challenge_is_classified() {
        let transport = MockTransport::new().with_json(
            200,
            r#"{
                "challenge_type": "oob",
                "continuation_token": "ct-2",
                "challenge_target_label": "u***@contoso.com",
                "challenge_channel": "email",
                "code_length": 8
            }"#,
        );

        let outcome = request_challenge(
            &transport,
            &config(),
            Endpoint::SignInChallenge,
            "ct-1",
            &RequestContext::new(),
        )
        .await
        .unwrap();

        match outcome {
            ChallengeOutcome::OobSent {
                continuation_token,
                sent_to,
                channel,
                code_length,
            } => {
                assert_eq!(continuation_token, "ct-2");
                assert_eq!(sent_to, "u***@contoso.com");
                assert_eq!(channel, ChallengeChannel::Email);
                assert_eq!(code_length, 8);
            }
            other => panic!("expected oob, got {other:?}"),
        }

        let recorded = transport.recorded_requests();
        assert_eq!(recorded[0].form_value("continuation_token"), Some("ct-1"));
        assert_eq!(
            recorded[0].form_value("challenge_type"),
            Some("oob password redirect")
        );
    }

    #[tokio::test]
    async fn test_redirect_wins_over_everything() {
        let transport = MockTransport::new()
            .with_json(200, r#"{"challenge_type":"redirect","continuation_token":"ct-2"}"#);
        let outcome = request_challenge(
            &transport,
            &config(),
            Endpoint::ResetPasswordChallenge,
            "ct-1",
            &RequestContext::new(),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, ChallengeOutcome::Redirect));
    }

    #[tokio::test]
    async fn test_incomplete_oob_answer_is_unexpected() {
        let transport =
            MockTransport::new().with_json(200, r#"{"challenge_type":"oob","code_length":8}"#);
        let outcome = request_challenge(
            &transport,
            &config(),
            Endpoint::SignUpChallenge,
            "ct-1",
            &RequestContext::new(),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, ChallengeOutcome::Unexpected));
    }
}
