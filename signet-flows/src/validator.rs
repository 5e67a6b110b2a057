//! The token response validator.
//!
//! [`TokenResponseValidator::validate`] converts the raw result of one token
//! endpoint round-trip into a [`ValidatedTokenResponse`]: a terminal success
//! carrying the account, or a failure drawn from a closed taxonomy.
//!
//! Mapping rules:
//! - every top-level error code except `invalid_grant` maps 1:1;
//! - under `invalid_grant`, the ordered `error_codes` list is scanned and the
//!   first recognized numeric sub-code wins; unrecognized entries are skipped;
//! - an empty or all-unknown list degrades to the general-error case;
//! - anything unstructured (transport failures, undecodable bodies, failed
//!   account construction) degrades to the invalid-server-response case.
//!
//! The validator never panics and never lets an untyped error cross its
//! boundary.

use std::fmt;
use std::sync::Arc;

use signet_core::{
    AccountIdentifier, AccountResult, ClientConfiguration, IdTokenClaims, RequestContext,
    ServerSubErrorCode, TokenApiError, TokenErrorResponse, TokenResponse, TokenResult,
};
use thiserror::Error;

use crate::error::{messages, ErrorDescriptor};
use crate::token::TokenRequestError;
use crate::token_handler::{
    AccountResultFactory, StandardAccountFactory, StandardTokenHandler, TokenResponseHandler,
};

/// The closed taxonomy of token validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidationErrorKind {
    /// The answer was malformed, unstructured, or could not be turned into an
    /// account.
    InvalidServerResponse,
    /// The request was malformed.
    InvalidRequest,
    /// The client id is unknown or not allowed.
    InvalidClient,
    /// The continuation token has expired.
    ExpiredToken,
    /// The refresh token has expired.
    ExpiredRefreshToken,
    /// The server requires a challenge type the client did not advertise.
    UnsupportedChallengeType,
    /// A requested scope is invalid.
    InvalidScope,
    /// The authorization is still pending on the server.
    AuthorizationPending,
    /// The client is polling too fast.
    SlowDown,
    /// No account exists for the supplied username.
    UserNotFound,
    /// The supplied password is wrong.
    InvalidPassword,
    /// The authentication method is not valid for this account.
    InvalidAuthenticationType,
    /// The one-time code is wrong or was already used.
    InvalidOobCode,
    /// The account requires multi-factor authentication.
    StrongAuthRequired,
    /// Any other failure.
    GeneralError,
}

impl TokenValidationErrorKind {
    fn default_message(self) -> &'static str {
        match self {
            Self::InvalidServerResponse => messages::UNEXPECTED_RESPONSE,
            Self::UserNotFound => messages::USER_NOT_FOUND,
            Self::InvalidPassword => messages::INVALID_PASSWORD,
            Self::InvalidOobCode => messages::INVALID_CODE,
            Self::UnsupportedChallengeType | Self::StrongAuthRequired => {
                messages::BROWSER_REQUIRED
            }
            Self::ExpiredRefreshToken => messages::REFRESH_TOKEN_EXPIRED,
            _ => messages::GENERAL_ERROR,
        }
    }
}

/// A typed token validation failure.
#[derive(Error, Debug, Clone)]
pub struct TokenValidationError {
    kind: TokenValidationErrorKind,
    descriptor: ErrorDescriptor,
}

impl TokenValidationError {
    /// Build an error for the given case.
    #[must_use]
    pub fn new(kind: TokenValidationErrorKind, descriptor: ErrorDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// The error case.
    #[must_use]
    pub fn kind(&self) -> TokenValidationErrorKind {
        self.kind
    }

    /// The shared descriptor fields.
    #[must_use]
    pub fn descriptor(&self) -> &ErrorDescriptor {
        &self.descriptor
    }

    /// Consume the error, keeping its descriptor.
    #[must_use]
    pub fn into_descriptor(self) -> ErrorDescriptor {
        self.descriptor
    }

    /// Describes why validation failed; server-supplied when available,
    /// otherwise a fixed per-case default.
    #[must_use]
    pub fn message(&self) -> &str {
        self.descriptor.message_or(self.kind.default_message())
    }
}

impl fmt::Display for TokenValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Outcome of validating one token endpoint result.
#[derive(Debug)]
pub enum ValidatedTokenResponse {
    /// The response yielded a signed-in account.
    Success {
        /// The caller-facing account result.
        account_result: AccountResult,
        /// The converted tokens.
        token_result: TokenResult,
        /// The raw wire payload the result was built from.
        raw: TokenResponse,
    },
    /// The response was a typed failure.
    Error(TokenValidationError),
}

/// Converts raw token endpoint results into [`ValidatedTokenResponse`]s.
pub struct TokenResponseValidator {
    handler: Arc<dyn TokenResponseHandler>,
    factory: Arc<dyn AccountResultFactory>,
}

impl TokenResponseValidator {
    /// Build a validator over the given collaborators.
    #[must_use]
    pub fn new(
        handler: Arc<dyn TokenResponseHandler>,
        factory: Arc<dyn AccountResultFactory>,
    ) -> Self {
        Self { handler, factory }
    }

    /// Build a validator over the production collaborators.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            Arc::new(StandardTokenHandler::new()),
            Arc::new(StandardAccountFactory::new()),
        )
    }

    /// Validate one token endpoint result.
    #[must_use]
    pub fn validate(
        &self,
        context: &RequestContext,
        configuration: &ClientConfiguration,
        result: Result<TokenResponse, TokenRequestError>,
    ) -> ValidatedTokenResponse {
        match result {
            Ok(token_response) => self.validate_success(context, configuration, token_response),
            Err(TokenRequestError::Api(body)) => Self::validate_api_error(context, &body),
            Err(error) => {
                tracing::error!(
                    correlation_id = %context.correlation_id(),
                    %error,
                    "Token answer was not a structured token error"
                );
                Self::error(context, TokenValidationErrorKind::InvalidServerResponse)
            }
        }
    }

    fn validate_success(
        &self,
        context: &RequestContext,
        configuration: &ClientConfiguration,
        token_response: TokenResponse,
    ) -> ValidatedTokenResponse {
        let identifier = match token_response
            .id_token
            .as_deref()
            .map(IdTokenClaims::decode)
            .transpose()
        {
            Ok(claims) => claims
                .as_ref()
                .map(AccountIdentifier::from_claims)
                .unwrap_or_default(),
            Err(error) => {
                tracing::error!(
                    correlation_id = %context.correlation_id(),
                    %error,
                    "Id token in the response did not decode"
                );
                return Self::error(context, TokenValidationErrorKind::InvalidServerResponse);
            }
        };

        let token_result = match self.handler.handle(
            context,
            &identifier,
            &token_response,
            configuration,
            true,
        ) {
            Ok(token_result) => token_result,
            Err(error) => {
                tracing::error!(
                    correlation_id = %context.correlation_id(),
                    %error,
                    "Token response validation failed"
                );
                return Self::error(context, TokenValidationErrorKind::InvalidServerResponse);
            }
        };

        let Some(account_result) = self.factory.make_account_result(&token_result, context) else {
            tracing::error!(
                correlation_id = %context.correlation_id(),
                "Token result did not yield an account"
            );
            return Self::error(context, TokenValidationErrorKind::InvalidServerResponse);
        };

        ValidatedTokenResponse::Success {
            account_result,
            token_result,
            raw: token_response,
        }
    }

    fn validate_api_error(
        context: &RequestContext,
        body: &TokenErrorResponse,
    ) -> ValidatedTokenResponse {
        let kind = match body.error {
            TokenApiError::InvalidRequest => TokenValidationErrorKind::InvalidRequest,
            TokenApiError::InvalidClient => TokenValidationErrorKind::InvalidClient,
            TokenApiError::InvalidGrant => Self::map_invalid_grant(context, &body.error_codes),
            TokenApiError::ExpiredToken => TokenValidationErrorKind::ExpiredToken,
            TokenApiError::ExpiredRefreshToken => TokenValidationErrorKind::ExpiredRefreshToken,
            TokenApiError::UnsupportedChallengeType => {
                TokenValidationErrorKind::UnsupportedChallengeType
            }
            TokenApiError::InvalidScope => TokenValidationErrorKind::InvalidScope,
            TokenApiError::AuthorizationPending => TokenValidationErrorKind::AuthorizationPending,
            TokenApiError::SlowDown => TokenValidationErrorKind::SlowDown,
        };

        let mut descriptor =
            ErrorDescriptor::new().with_correlation_id(context.correlation_id());
        if let Some(message) = body.error_description.as_deref() {
            descriptor = descriptor.with_message(message);
        }
        if let Some(uri) = body.error_uri.as_deref() {
            descriptor = descriptor.with_error_uri(uri);
        }
        ValidatedTokenResponse::Error(TokenValidationError::new(kind, descriptor))
    }

    /// Scan the ordered sub-code list; the first recognized code wins.
    fn map_invalid_grant(
        context: &RequestContext,
        error_codes: &[i64],
    ) -> TokenValidationErrorKind {
        let known = error_codes.iter().find_map(|&code| {
            let recognized = ServerSubErrorCode::from_code(code);
            if recognized.is_none() {
                tracing::warn!(
                    correlation_id = %context.correlation_id(),
                    code,
                    "Unknown code in error_codes"
                );
            }
            recognized
        });

        match known {
            Some(sub_code) => Self::map_sub_error(sub_code),
            None => {
                tracing::error!(
                    correlation_id = %context.correlation_id(),
                    "invalid_grant without a recognized error code"
                );
                TokenValidationErrorKind::GeneralError
            }
        }
    }

    fn map_sub_error(code: ServerSubErrorCode) -> TokenValidationErrorKind {
        match code {
            ServerSubErrorCode::UserNotFound => TokenValidationErrorKind::UserNotFound,
            ServerSubErrorCode::InvalidCredentials => TokenValidationErrorKind::InvalidPassword,
            ServerSubErrorCode::InvalidAuthenticationType => {
                TokenValidationErrorKind::InvalidAuthenticationType
            }
            ServerSubErrorCode::InvalidOtp => TokenValidationErrorKind::InvalidOobCode,
            ServerSubErrorCode::StrongAuthRequired => TokenValidationErrorKind::StrongAuthRequired,
            ServerSubErrorCode::InvalidPasswordResetToken => TokenValidationErrorKind::GeneralError,
        }
    }

    fn error(context: &RequestContext, kind: TokenValidationErrorKind) -> ValidatedTokenResponse {
        ValidatedTokenResponse::Error(TokenValidationError::new(
            kind,
            ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use signet_transport::TransportError;

    fn config() -> ClientConfiguration {
        ClientConfiguration::new("client-1", "https://contoso.ciamlogin.com/contoso")
            .unwrap()
            .with_scopes(["openid"])
    }

    fn api_error(body: &str) -> TokenRequestError {
        TokenRequestError::Api(serde_json::from_str(body).unwrap())
    }

    fn kind_of(response: ValidatedTokenResponse) -> TokenValidationErrorKind {
        match response {
            ValidatedTokenResponse::Error(error) => error.kind(),
            ValidatedTokenResponse::Success { .. } => panic!("expected an error"),
        }
    }

    fn id_token(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.sig")
    }

    fn success_response() -> TokenResponse {
        TokenResponse {
            token_type: Some("Bearer".into()),
            scope: Some("openid".into()),
            expires_in: Some(3600),
            ext_expires_in: None,
            access_token: Some("at-1".into()),
            refresh_token: Some("rt-1".into()),
            id_token: Some(id_token(&serde_json::json!({
                "preferred_username": "user@contoso.com",
                "oid": "oid-1",
            }))),
        }
    }

    #[rstest]
    #[case("invalid_request", TokenValidationErrorKind::InvalidRequest)]
    #[case("invalid_client", TokenValidationErrorKind::InvalidClient)]
    #[case("expired_token", TokenValidationErrorKind::ExpiredToken)]
    #[case("expired_refresh_token", TokenValidationErrorKind::ExpiredRefreshToken)]
    #[case("unsupported_challenge_type", TokenValidationErrorKind::UnsupportedChallengeType)]
    #[case("invalid_scope", TokenValidationErrorKind::InvalidScope)]
    #[case("authorization_pending", TokenValidationErrorKind::AuthorizationPending)]
    #[case("slow_down", TokenValidationErrorKind::SlowDown)]
    fn test_top_level_codes_map_one_to_one(
        #[case] code: &str,
        #[case] expected: TokenValidationErrorKind,
    ) {
        let validator = TokenResponseValidator::standard();
        let result = validator.validate(
            &RequestContext::new(),
            &config(),
            Err(api_error(&format!("{{\"error\":\"{code}\"}}"))),
        );
        assert_eq!(kind_of(result), expected);
    }

    #[rstest]
    #[case(vec![50034], TokenValidationErrorKind::UserNotFound)]
    #[case(vec![50126], TokenValidationErrorKind::InvalidPassword)]
    #[case(vec![400002], TokenValidationErrorKind::InvalidAuthenticationType)]
    #[case(vec![50181], TokenValidationErrorKind::InvalidOobCode)]
    #[case(vec![50079], TokenValidationErrorKind::StrongAuthRequired)]
    #[case(vec![90158], TokenValidationErrorKind::GeneralError)]
    fn test_invalid_grant_sub_codes(
        #[case] codes: Vec<i64>,
        #[case] expected: TokenValidationErrorKind,
    ) {
        let validator = TokenResponseValidator::standard();
        let body = serde_json::json!({"error": "invalid_grant", "error_codes": codes});
        let result = validator.validate(
            &RequestContext::new(),
            &config(),
            Err(api_error(&body.to_string())),
        );
        assert_eq!(kind_of(result), expected);
    }

    #[test]
    fn test_first_recognized_sub_code_wins() {
        let validator = TokenResponseValidator::standard();
        let result = validator.validate(
            &RequestContext::new(),
            &config(),
            Err(api_error(
                r#"{"error":"invalid_grant","error_codes":[99999, 50126, 50034]}"#,
            )),
        );
        assert_eq!(kind_of(result), TokenValidationErrorKind::InvalidPassword);
    }

    #[test]
    fn test_empty_or_unknown_sub_codes_degrade_to_general_error() {
        let validator = TokenResponseValidator::standard();
        let context = RequestContext::new();

        let empty = validator.validate(
            &context,
            &config(),
            Err(api_error(r#"{"error":"invalid_grant","error_codes":[]}"#)),
        );
        assert_eq!(kind_of(empty), TokenValidationErrorKind::GeneralError);

        let unknown = validator.validate(
            &context,
            &config(),
            Err(api_error(r#"{"error":"invalid_grant","error_codes":[1, 2, 3]}"#)),
        );
        assert_eq!(kind_of(unknown), TokenValidationErrorKind::GeneralError);
    }

    #[test]
    fn test_unstructured_failures_are_invalid_server_response() {
        let validator = TokenResponseValidator::standard();
        let context = RequestContext::new();

        let transport = validator.validate(
            &context,
            &config(),
            Err(TokenRequestError::Transport(TransportError::Timeout)),
        );
        assert_eq!(
            kind_of(transport),
            TokenValidationErrorKind::InvalidServerResponse
        );

        let unstructured = validator.validate(
            &context,
            &config(),
            Err(TokenRequestError::Unstructured { status: 502 }),
        );
        assert_eq!(
            kind_of(unstructured),
            TokenValidationErrorKind::InvalidServerResponse
        );
    }

    #[test]
    fn test_success_round_trip_preserves_the_username_claim() {
        let validator = TokenResponseValidator::standard();
        let result = validator.validate(
            &RequestContext::new(),
            &config(),
            Ok(success_response()),
        );

        match result {
            ValidatedTokenResponse::Success {
                account_result,
                token_result,
                raw,
            } => {
                assert_eq!(account_result.username(), "user@contoso.com");
                assert_eq!(account_result.home_account_id(), "oid-1");
                assert_eq!(token_result.access_token, "at-1");
                assert_eq!(raw.access_token.as_deref(), Some("at-1"));
            }
            ValidatedTokenResponse::Error(error) => panic!("expected success, got {error}"),
        }
    }

    #[test]
    fn test_unusable_success_degrades_to_invalid_server_response() {
        let validator = TokenResponseValidator::standard();
        let context = RequestContext::new();

        let mut no_access_token = success_response();
        no_access_token.access_token = None;
        let result = validator.validate(&context, &config(), Ok(no_access_token));
        assert_eq!(
            kind_of(result),
            TokenValidationErrorKind::InvalidServerResponse
        );

        let mut garbage_id_token = success_response();
        garbage_id_token.id_token = Some("two.segments".into());
        let result = validator.validate(&context, &config(), Ok(garbage_id_token));
        assert_eq!(
            kind_of(result),
            TokenValidationErrorKind::InvalidServerResponse
        );

        // No id token at all: the tokens convert, but no account can be built.
        let mut anonymous = success_response();
        anonymous.id_token = None;
        let result = validator.validate(&context, &config(), Ok(anonymous));
        assert_eq!(
            kind_of(result),
            TokenValidationErrorKind::InvalidServerResponse
        );
    }

    #[test]
    fn test_slow_down_preserves_description_and_uri() {
        let validator = TokenResponseValidator::standard();
        let result = validator.validate(
            &RequestContext::new(),
            &config(),
            Err(api_error(
                r#"{"error":"slow_down","error_description":"Polling too fast.","error_uri":"https://login.example.com/error?code=slow_down"}"#,
            )),
        );

        match result {
            ValidatedTokenResponse::Error(error) => {
                assert_eq!(error.kind(), TokenValidationErrorKind::SlowDown);
                assert_eq!(error.message(), "Polling too fast.");
                assert_eq!(
                    error.descriptor().error_uri.as_deref(),
                    Some("https://login.example.com/error?code=slow_down")
                );
            }
            ValidatedTokenResponse::Success { .. } => panic!("expected an error"),
        }
    }

    #[test]
    fn test_every_failure_carries_a_non_empty_message() {
        let validator = TokenResponseValidator::standard();
        for body in [
            r#"{"error":"invalid_request"}"#,
            r#"{"error":"invalid_grant","error_codes":[50126]}"#,
            r#"{"error":"invalid_grant","error_codes":[]}"#,
            r#"{"error":"slow_down"}"#,
        ] {
            let result =
                validator.validate(&RequestContext::new(), &config(), Err(api_error(body)));
            match result {
                ValidatedTokenResponse::Error(error) => assert!(!error.message().is_empty()),
                ValidatedTokenResponse::Success { .. } => panic!("expected an error"),
            }
        }
    }
}
