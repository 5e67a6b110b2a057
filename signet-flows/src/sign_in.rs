//! The sign-in flow.
//!
//! `start` initiates the flow and asks the server which credential it wants.
//! With a password supplied up front the controller completes in one call;
//! otherwise the caller receives a code-sent or password-required state and
//! continues with `submit_code` / `submit_password`. A completed sign-up hands
//! out a [`SignInAfterSignUpState`] that `sign_in_after_sign_up` redeems
//! silently.

use std::sync::Arc;

use async_trait::async_trait;
use signet_core::{AccountResult, ChallengeResponse, ClientConfiguration, RequestContext};
use signet_transport::{ApiRequest, AuthTransport, Endpoint};

use crate::api::{self, ApiFailure};
use crate::challenge::{self, ChallengeOutcome};
use crate::error::{
    messages, ErrorDescriptor, PasswordRequiredError, PasswordRequiredErrorKind, ResendCodeError,
    ResendCodeErrorKind, SignInAfterSignUpError, SignInAfterSignUpErrorKind, SignInStartError,
    SignInStartErrorKind, VerifyCodeError, VerifyCodeErrorKind,
};
use crate::state::{
    ChallengeChannel, SignInAfterSignUpState, SignInCodeSentState, SignInPasswordRequiredState,
};
use crate::token;
use crate::validator::{
    TokenResponseValidator, TokenValidationError, TokenValidationErrorKind, ValidatedTokenResponse,
};

/// Input of [`SignInController::start`].
#[derive(Debug, Clone)]
pub struct SignInParameters {
    username: String,
    password: Option<String>,
    scopes: Vec<String>,
}

impl SignInParameters {
    /// Parameters for a code-first sign-in.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            scopes: Vec::new(),
        }
    }

    /// Supply the password up front so a password challenge completes without
    /// a separate step.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Request specific scopes instead of the configured defaults.
    #[must_use]
    pub fn with_scopes<S: Into<String>>(mut self, scopes: impl IntoIterator<Item = S>) -> Self {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// The username to sign in.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Outcome of [`SignInController::start`].
#[derive(Debug)]
pub enum SignInStartOutcome {
    /// The sign-in completed in one call.
    Completed(AccountResult),
    /// A one-time code was sent; submit it next.
    CodeRequired {
        /// State for the submit-code step.
        state: SignInCodeSentState,
        /// Masked label of the code target.
        sent_to: String,
        /// Delivery channel of the code.
        channel: ChallengeChannel,
        /// Length of the code that was sent.
        code_length: u32,
    },
    /// The server selected the password challenge and no password was
    /// supplied up front.
    PasswordRequired(SignInPasswordRequiredState),
    /// The flow could not be started.
    Error(SignInStartError),
}

impl SignInStartOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn SignInStartDelegate) {
        match self {
            Self::Completed(result) => delegate.on_sign_in_completed(result).await,
            Self::CodeRequired {
                state,
                sent_to,
                channel,
                code_length,
            } => {
                delegate
                    .on_sign_in_code_required(state, sent_to, channel, code_length)
                    .await;
            }
            Self::PasswordRequired(state) => delegate.on_sign_in_password_required(state).await,
            Self::Error(error) => delegate.on_sign_in_start_error(error).await,
        }
    }
}

/// Callback contract for [`SignInController::start`].
#[async_trait]
pub trait SignInStartDelegate: Send + Sync {
    /// The sign-in completed.
    async fn on_sign_in_completed(&self, result: AccountResult);

    /// A one-time code was sent.
    async fn on_sign_in_code_required(
        &self,
        state: SignInCodeSentState,
        sent_to: String,
        channel: ChallengeChannel,
        code_length: u32,
    );

    /// A password must be submitted.
    async fn on_sign_in_password_required(&self, state: SignInPasswordRequiredState);

    /// The flow could not be started.
    async fn on_sign_in_start_error(&self, error: SignInStartError);
}

/// Outcome of [`SignInController::submit_code`].
#[derive(Debug)]
pub enum SignInVerifyCodeOutcome {
    /// The sign-in completed.
    Completed(AccountResult),
    /// The code was rejected. A wrong code carries a fresh state for one
    /// retry; terminal failures carry none.
    Error {
        /// Why the code was rejected.
        error: VerifyCodeError,
        /// Fresh state for a retry, when the failure is recoverable.
        new_state: Option<SignInCodeSentState>,
    },
}

impl SignInVerifyCodeOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn SignInVerifyCodeDelegate) {
        match self {
            Self::Completed(result) => delegate.on_sign_in_completed(result).await,
            Self::Error { error, new_state } => {
                delegate.on_verify_code_error(error, new_state).await;
            }
        }
    }
}

/// Callback contract for [`SignInController::submit_code`].
#[async_trait]
pub trait SignInVerifyCodeDelegate: Send + Sync {
    /// The sign-in completed.
    async fn on_sign_in_completed(&self, result: AccountResult);

    /// The code was rejected.
    async fn on_verify_code_error(
        &self,
        error: VerifyCodeError,
        new_state: Option<SignInCodeSentState>,
    );
}

/// Outcome of [`SignInController::resend_code`].
#[derive(Debug)]
pub enum SignInResendCodeOutcome {
    /// A fresh code was sent; the previous one is void.
    CodeRequired {
        /// State for the submit-code step.
        state: SignInCodeSentState,
        /// Masked label of the code target.
        sent_to: String,
        /// Delivery channel of the code.
        channel: ChallengeChannel,
        /// Length of the code that was sent.
        code_length: u32,
    },
    /// No new code could be sent. Resend failures are terminal.
    Error(ResendCodeError),
}

impl SignInResendCodeOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn SignInResendCodeDelegate) {
        match self {
            Self::CodeRequired {
                state,
                sent_to,
                channel,
                code_length,
            } => {
                delegate
                    .on_sign_in_resend_code_sent(state, sent_to, channel, code_length)
                    .await;
            }
            Self::Error(error) => delegate.on_sign_in_resend_code_error(error).await,
        }
    }
}

/// Callback contract for [`SignInController::resend_code`].
#[async_trait]
pub trait SignInResendCodeDelegate: Send + Sync {
    /// A fresh code was sent.
    async fn on_sign_in_resend_code_sent(
        &self,
        state: SignInCodeSentState,
        sent_to: String,
        channel: ChallengeChannel,
        code_length: u32,
    );

    /// No new code could be sent.
    async fn on_sign_in_resend_code_error(&self, error: ResendCodeError);
}

/// Outcome of [`SignInController::submit_password`].
#[derive(Debug)]
pub enum SignInSubmitPasswordOutcome {
    /// The sign-in completed.
    Completed(AccountResult),
    /// The password was rejected. A wrong password carries a fresh state for
    /// one retry; terminal failures carry none.
    Error {
        /// Why the password was rejected.
        error: PasswordRequiredError,
        /// Fresh state for a retry, when the failure is recoverable.
        new_state: Option<SignInPasswordRequiredState>,
    },
}

impl SignInSubmitPasswordOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn SignInPasswordRequiredDelegate) {
        match self {
            Self::Completed(result) => delegate.on_sign_in_completed(result).await,
            Self::Error { error, new_state } => {
                delegate.on_password_required_error(error, new_state).await;
            }
        }
    }
}

/// Callback contract for [`SignInController::submit_password`].
#[async_trait]
pub trait SignInPasswordRequiredDelegate: Send + Sync {
    /// The sign-in completed.
    async fn on_sign_in_completed(&self, result: AccountResult);

    /// The password was rejected.
    async fn on_password_required_error(
        &self,
        error: PasswordRequiredError,
        new_state: Option<SignInPasswordRequiredState>,
    );
}

/// Outcome of [`SignInController::sign_in_after_sign_up`].
#[derive(Debug)]
pub enum SignInAfterSignUpOutcome {
    /// The silent sign-in completed.
    Completed(AccountResult),
    /// The silent sign-in failed; fall back to a regular sign-in.
    Error(SignInAfterSignUpError),
}

impl SignInAfterSignUpOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn SignInAfterSignUpDelegate) {
        match self {
            Self::Completed(result) => delegate.on_sign_in_completed(result).await,
            Self::Error(error) => delegate.on_sign_in_after_sign_up_error(error).await,
        }
    }
}

/// Callback contract for [`SignInController::sign_in_after_sign_up`].
#[async_trait]
pub trait SignInAfterSignUpDelegate: Send + Sync {
    /// The silent sign-in completed.
    async fn on_sign_in_completed(&self, result: AccountResult);

    /// The silent sign-in failed.
    async fn on_sign_in_after_sign_up_error(&self, error: SignInAfterSignUpError);
}

/// Drives the sign-in flow.
pub struct SignInController {
    transport: Arc<dyn AuthTransport>,
    config: Arc<ClientConfiguration>,
    validator: TokenResponseValidator,
}

impl SignInController {
    /// Build a controller over the given transport and configuration.
    #[must_use]
    pub fn new(transport: Arc<dyn AuthTransport>, config: Arc<ClientConfiguration>) -> Self {
        Self {
            transport,
            config,
            validator: TokenResponseValidator::standard(),
        }
    }

    /// Replace the token response validator, e.g. to substitute failing
    /// collaborators in tests.
    #[must_use]
    pub fn with_validator(mut self, validator: TokenResponseValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Start a sign-in flow.
    pub async fn start(&self, parameters: SignInParameters) -> SignInStartOutcome {
        let context = RequestContext::new();
        tracing::debug!(
            correlation_id = %context.correlation_id(),
            username = parameters.username(),
            "Starting sign-in flow"
        );

        if parameters.username.trim().is_empty() {
            return SignInStartOutcome::Error(SignInStartError::new(
                SignInStartErrorKind::InvalidUsername,
                ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
            ));
        }

        let request = ApiRequest::new(Endpoint::SignInInitiate)
            .form("client_id", self.config.client_id())
            .form("challenge_type", self.config.challenge_types_value())
            .form("username", &parameters.username);

        let initiate: ChallengeResponse =
            match api::send_request(self.transport.as_ref(), request, &context).await {
                Ok(response) => response,
                Err(failure) => {
                    return SignInStartOutcome::Error(Self::start_error(&failure, &context));
                }
            };

        if initiate.is_redirect() {
            return SignInStartOutcome::Error(SignInStartError::new(
                SignInStartErrorKind::BrowserRequired,
                ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
            ));
        }
        let Some(continuation_token) = initiate.continuation_token else {
            return SignInStartOutcome::Error(SignInStartError::new(
                SignInStartErrorKind::GeneralError,
                Self::unexpected(&context),
            ));
        };

        match challenge::request_challenge(
            self.transport.as_ref(),
            &self.config,
            Endpoint::SignInChallenge,
            &continuation_token,
            &context,
        )
        .await
        {
            Ok(ChallengeOutcome::OobSent {
                continuation_token,
                sent_to,
                channel,
                code_length,
            }) => SignInStartOutcome::CodeRequired {
                state: SignInCodeSentState::new(
                    continuation_token,
                    parameters.username.clone(),
                    context.correlation_id(),
                    sent_to.clone(),
                    channel,
                    code_length,
                    parameters.scopes.clone(),
                ),
                sent_to,
                channel,
                code_length,
            },
            Ok(ChallengeOutcome::PasswordRequired { continuation_token }) => {
                match parameters.password.as_deref() {
                    Some(password) => {
                        self.redeem_password(&parameters, password, &continuation_token, &context)
                            .await
                    }
                    None => SignInStartOutcome::PasswordRequired(SignInPasswordRequiredState::new(
                        continuation_token,
                        parameters.username.clone(),
                        context.correlation_id(),
                        parameters.scopes.clone(),
                    )),
                }
            }
            Ok(ChallengeOutcome::Redirect) => SignInStartOutcome::Error(SignInStartError::new(
                SignInStartErrorKind::BrowserRequired,
                ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
            )),
            Ok(ChallengeOutcome::Unexpected) => SignInStartOutcome::Error(SignInStartError::new(
                SignInStartErrorKind::GeneralError,
                Self::unexpected(&context),
            )),
            Err(failure) => SignInStartOutcome::Error(Self::start_error(&failure, &context)),
        }
    }

    async fn redeem_password(
        &self,
        parameters: &SignInParameters,
        password: &str,
        continuation_token: &str,
        context: &RequestContext,
    ) -> SignInStartOutcome {
        let request = token::password_grant(
            &self.config,
            continuation_token,
            &parameters.username,
            password,
            &parameters.scopes,
        );
        let result = token::request_token(self.transport.as_ref(), request, context).await;
        match self.validator.validate(context, &self.config, result) {
            ValidatedTokenResponse::Success { account_result, .. } => {
                SignInStartOutcome::Completed(account_result)
            }
            ValidatedTokenResponse::Error(error) => {
                SignInStartOutcome::Error(Self::start_error_from_validation(error))
            }
        }
    }

    /// Submit the one-time code that was sent to the user.
    pub async fn submit_code(
        &self,
        code: &str,
        state: &SignInCodeSentState,
    ) -> SignInVerifyCodeOutcome {
        let context = RequestContext::with_correlation_id(state.correlation_id());
        if !state.consume() {
            return SignInVerifyCodeOutcome::Error {
                error: VerifyCodeError::new(
                    VerifyCodeErrorKind::GeneralError,
                    Self::invalid_state(&context),
                ),
                new_state: None,
            };
        }

        let request =
            token::oob_grant(&self.config, state.continuation_token(), code, state.scopes());
        let result = token::request_token(self.transport.as_ref(), request, &context).await;
        match self.validator.validate(&context, &self.config, result) {
            ValidatedTokenResponse::Success { account_result, .. } => {
                SignInVerifyCodeOutcome::Completed(account_result)
            }
            ValidatedTokenResponse::Error(error) if error.kind() == TokenValidationErrorKind::InvalidOobCode => {
                SignInVerifyCodeOutcome::Error {
                    error: VerifyCodeError::new(
                        VerifyCodeErrorKind::InvalidCode,
                        error.into_descriptor(),
                    ),
                    new_state: Some(SignInCodeSentState::new(
                        state.continuation_token(),
                        state.username(),
                        context.correlation_id(),
                        state.sent_to(),
                        state.channel(),
                        state.code_length(),
                        state.scopes().to_vec(),
                    )),
                }
            }
            ValidatedTokenResponse::Error(error) => {
                let kind = match error.kind() {
                    TokenValidationErrorKind::StrongAuthRequired
                    | TokenValidationErrorKind::UnsupportedChallengeType => {
                        VerifyCodeErrorKind::BrowserRequired
                    }
                    _ => VerifyCodeErrorKind::GeneralError,
                };
                SignInVerifyCodeOutcome::Error {
                    error: VerifyCodeError::new(kind, error.into_descriptor()),
                    new_state: None,
                }
            }
        }
    }

    /// Request a fresh one-time code for an in-flight flow.
    pub async fn resend_code(&self, state: &SignInCodeSentState) -> SignInResendCodeOutcome {
        let context = RequestContext::with_correlation_id(state.correlation_id());
        if !state.consume() {
            return SignInResendCodeOutcome::Error(ResendCodeError::new(
                ResendCodeErrorKind::GeneralError,
                Self::invalid_state(&context),
            ));
        }

        match challenge::request_challenge(
            self.transport.as_ref(),
            &self.config,
            Endpoint::SignInChallenge,
            state.continuation_token(),
            &context,
        )
        .await
        {
            Ok(ChallengeOutcome::OobSent {
                continuation_token,
                sent_to,
                channel,
                code_length,
            }) => SignInResendCodeOutcome::CodeRequired {
                state: SignInCodeSentState::new(
                    continuation_token,
                    state.username(),
                    context.correlation_id(),
                    sent_to.clone(),
                    channel,
                    code_length,
                    state.scopes().to_vec(),
                ),
                sent_to,
                channel,
                code_length,
            },
            Ok(ChallengeOutcome::Redirect) => SignInResendCodeOutcome::Error(ResendCodeError::new(
                ResendCodeErrorKind::BrowserRequired,
                ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
            )),
            Ok(_) => SignInResendCodeOutcome::Error(ResendCodeError::new(
                ResendCodeErrorKind::GeneralError,
                Self::unexpected(&context),
            )),
            Err(failure) => {
                let kind = match &failure {
                    ApiFailure::Api(error) if error.is_redirect() => {
                        ResendCodeErrorKind::BrowserRequired
                    }
                    _ => ResendCodeErrorKind::GeneralError,
                };
                SignInResendCodeOutcome::Error(ResendCodeError::new(
                    kind,
                    failure.descriptor(&context),
                ))
            }
        }
    }

    /// Submit the password the server asked for.
    pub async fn submit_password(
        &self,
        password: &str,
        state: &SignInPasswordRequiredState,
    ) -> SignInSubmitPasswordOutcome {
        let context = RequestContext::with_correlation_id(state.correlation_id());
        if !state.consume() {
            return SignInSubmitPasswordOutcome::Error {
                error: PasswordRequiredError::new(
                    PasswordRequiredErrorKind::GeneralError,
                    Self::invalid_state(&context),
                ),
                new_state: None,
            };
        }

        let request = token::password_grant(
            &self.config,
            state.continuation_token(),
            state.username(),
            password,
            state.scopes(),
        );
        let result = token::request_token(self.transport.as_ref(), request, &context).await;
        match self.validator.validate(&context, &self.config, result) {
            ValidatedTokenResponse::Success { account_result, .. } => {
                SignInSubmitPasswordOutcome::Completed(account_result)
            }
            ValidatedTokenResponse::Error(error)
                if error.kind() == TokenValidationErrorKind::InvalidPassword =>
            {
                SignInSubmitPasswordOutcome::Error {
                    error: PasswordRequiredError::new(
                        PasswordRequiredErrorKind::InvalidPassword,
                        error.into_descriptor(),
                    ),
                    new_state: Some(SignInPasswordRequiredState::new(
                        state.continuation_token(),
                        state.username(),
                        context.correlation_id(),
                        state.scopes().to_vec(),
                    )),
                }
            }
            ValidatedTokenResponse::Error(error) => {
                let kind = match error.kind() {
                    TokenValidationErrorKind::StrongAuthRequired
                    | TokenValidationErrorKind::UnsupportedChallengeType => {
                        PasswordRequiredErrorKind::BrowserRequired
                    }
                    _ => PasswordRequiredErrorKind::GeneralError,
                };
                SignInSubmitPasswordOutcome::Error {
                    error: PasswordRequiredError::new(kind, error.into_descriptor()),
                    new_state: None,
                }
            }
        }
    }

    /// Redeem the continuation token handed out by a completed sign-up.
    pub async fn sign_in_after_sign_up(
        &self,
        state: &SignInAfterSignUpState,
    ) -> SignInAfterSignUpOutcome {
        let context = RequestContext::with_correlation_id(state.correlation_id());
        if !state.consume() {
            return SignInAfterSignUpOutcome::Error(SignInAfterSignUpError::new(
                SignInAfterSignUpErrorKind::GeneralError,
                Self::invalid_state(&context),
            ));
        }

        let request = token::continuation_grant(
            &self.config,
            state.continuation_token(),
            state.username(),
            &[],
        );
        let result = token::request_token(self.transport.as_ref(), request, &context).await;
        match self.validator.validate(&context, &self.config, result) {
            ValidatedTokenResponse::Success { account_result, .. } => {
                SignInAfterSignUpOutcome::Completed(account_result)
            }
            ValidatedTokenResponse::Error(error) => {
                let kind = match error.kind() {
                    TokenValidationErrorKind::StrongAuthRequired
                    | TokenValidationErrorKind::UnsupportedChallengeType => {
                        SignInAfterSignUpErrorKind::BrowserRequired
                    }
                    _ => SignInAfterSignUpErrorKind::GeneralError,
                };
                SignInAfterSignUpOutcome::Error(SignInAfterSignUpError::new(
                    kind,
                    error.into_descriptor(),
                ))
            }
        }
    }

    fn start_error(failure: &ApiFailure, context: &RequestContext) -> SignInStartError {
        let kind = match failure {
            ApiFailure::Api(error) if error.is_redirect() => SignInStartErrorKind::BrowserRequired,
            ApiFailure::Api(error) if error.is_user_not_found() => {
                SignInStartErrorKind::UserNotFound
            }
            _ => SignInStartErrorKind::GeneralError,
        };
        SignInStartError::new(kind, failure.descriptor(context))
    }

    fn start_error_from_validation(error: TokenValidationError) -> SignInStartError {
        let kind = match error.kind() {
            TokenValidationErrorKind::InvalidPassword => SignInStartErrorKind::InvalidCredentials,
            TokenValidationErrorKind::UserNotFound => SignInStartErrorKind::UserNotFound,
            TokenValidationErrorKind::StrongAuthRequired
            | TokenValidationErrorKind::UnsupportedChallengeType => {
                SignInStartErrorKind::BrowserRequired
            }
            _ => SignInStartErrorKind::GeneralError,
        };
        SignInStartError::new(kind, error.into_descriptor())
    }

    fn unexpected(context: &RequestContext) -> ErrorDescriptor {
        ErrorDescriptor::new()
            .with_correlation_id(context.correlation_id())
            .with_message(messages::UNEXPECTED_RESPONSE)
    }

    fn invalid_state(context: &RequestContext) -> ErrorDescriptor {
        ErrorDescriptor::new()
            .with_correlation_id(context.correlation_id())
            .with_message(messages::INVALID_STATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use signet_transport::MockTransport;

    const PASSWORD_CHALLENGE: &str =
        r#"{"challenge_type":"password","continuation_token":"ct-pw"}"#;
    const OOB_CHALLENGE: &str = r#"{
        "challenge_type": "oob",
        "continuation_token": "ct-oob",
        "challenge_target_label": "u***@contoso.com",
        "challenge_channel": "email",
        "code_length": 8
    }"#;

    fn controller(transport: MockTransport) -> SignInController {
        let config = ClientConfiguration::new("client-1", "https://contoso.ciamlogin.com/contoso")
            .unwrap()
            .with_scopes(["openid"]);
        SignInController::new(Arc::new(transport), Arc::new(config))
    }

    fn token_body() -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({
                "preferred_username": "user@contoso.com",
                "oid": "oid-1",
            })
            .to_string()
            .as_bytes(),
        );
        serde_json::json!({
            "token_type": "Bearer",
            "scope": "openid",
            "expires_in": 3600,
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "id_token": format!("{header}.{payload}.sig"),
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_password_sign_in_completes_in_one_call() {
        let transport = MockTransport::new()
            .with_json(200, r#"{"continuation_token":"ct-init"}"#)
            .with_json(200, PASSWORD_CHALLENGE)
            .with_json(200, token_body());
        let observer = transport.clone();
        let controller = controller(transport);

        let parameters = SignInParameters::new("user@contoso.com").with_password("hunter2");
        match controller.start(parameters).await {
            SignInStartOutcome::Completed(result) => {
                assert_eq!(result.username(), "user@contoso.com");
                assert_eq!(result.token_result().access_token, "at-1");
            }
            other => panic!("expected completion, got {other:?}"),
        }

        let recorded = observer.recorded_requests();
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[2].endpoint(), Endpoint::Token);
        assert_eq!(recorded[2].form_value("grant_type"), Some("password"));
        assert_eq!(recorded[2].form_value("password"), Some("hunter2"));
    }

    #[tokio::test]
    async fn test_wrong_password_maps_to_invalid_credentials() {
        let transport = MockTransport::new()
            .with_json(200, r#"{"continuation_token":"ct-init"}"#)
            .with_json(200, PASSWORD_CHALLENGE)
            .with_json(
                400,
                r#"{"error":"invalid_grant","error_codes":[50126],"error_description":"Wrong password."}"#,
            );
        let controller = controller(transport);

        let parameters = SignInParameters::new("user@contoso.com").with_password("wrong");
        match controller.start(parameters).await {
            SignInStartOutcome::Error(error) => {
                assert!(error.is_invalid_credentials());
                assert_eq!(error.message(), "Wrong password.");
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_code_first_sign_in_round_trip() {
        let transport = MockTransport::new()
            .with_json(200, r#"{"continuation_token":"ct-init"}"#)
            .with_json(200, OOB_CHALLENGE)
            .with_json(200, token_body());
        let controller = controller(transport);

        let state = match controller.start(SignInParameters::new("user@contoso.com")).await {
            SignInStartOutcome::CodeRequired { state, code_length, .. } => {
                assert_eq!(code_length, 8);
                state
            }
            other => panic!("expected code required, got {other:?}"),
        };

        match controller.submit_code("123456", &state).await {
            SignInVerifyCodeOutcome::Completed(result) => {
                assert_eq!(result.home_account_id(), "oid-1");
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_code_carries_fresh_state_for_one_retry() {
        let transport = MockTransport::new()
            .with_json(200, r#"{"continuation_token":"ct-init"}"#)
            .with_json(200, OOB_CHALLENGE)
            .with_json(400, r#"{"error":"invalid_grant","error_codes":[50181]}"#)
            .with_json(200, token_body());
        let controller = controller(transport);

        let state = match controller.start(SignInParameters::new("user@contoso.com")).await {
            SignInStartOutcome::CodeRequired { state, .. } => state,
            other => panic!("expected code required, got {other:?}"),
        };

        let retry_state = match controller.submit_code("000000", &state).await {
            SignInVerifyCodeOutcome::Error { error, new_state } => {
                assert!(error.is_invalid_code());
                new_state.expect("wrong code must carry a fresh state")
            }
            other => panic!("expected recoverable error, got {other:?}"),
        };

        // the fresh state is good for exactly one more call
        match controller.submit_code("123456", &retry_state).await {
            SignInVerifyCodeOutcome::Completed(_) => {}
            other => panic!("expected completion, got {other:?}"),
        }
        match controller.submit_code("123456", &retry_state).await {
            SignInVerifyCodeOutcome::Error { error, new_state } => {
                assert!(new_state.is_none());
                assert_eq!(error.message(), messages::INVALID_STATE);
            }
            other => panic!("expected invalid-state error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_password_required_without_upfront_password() {
        let transport = MockTransport::new()
            .with_json(200, r#"{"continuation_token":"ct-init"}"#)
            .with_json(200, PASSWORD_CHALLENGE)
            .with_json(200, token_body());
        let controller = controller(transport);

        let state = match controller.start(SignInParameters::new("user@contoso.com")).await {
            SignInStartOutcome::PasswordRequired(state) => state,
            other => panic!("expected password required, got {other:?}"),
        };

        match controller.submit_password("hunter2", &state).await {
            SignInSubmitPasswordOutcome::Completed(result) => {
                assert_eq!(result.username(), "user@contoso.com");
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_strong_auth_required_surfaces_as_browser_required() {
        let transport = MockTransport::new()
            .with_json(200, r#"{"continuation_token":"ct-init"}"#)
            .with_json(200, PASSWORD_CHALLENGE)
            .with_json(400, r#"{"error":"invalid_grant","error_codes":[50079]}"#);
        let controller = controller(transport);

        let parameters = SignInParameters::new("user@contoso.com").with_password("hunter2");
        match controller.start(parameters).await {
            SignInStartOutcome::Error(error) => assert!(error.is_browser_required()),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
