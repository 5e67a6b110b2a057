//! The sign-up flow.
//!
//! `start` creates the flow and sends a verification code. After the code is
//! accepted the server may ask for a password, further profile attributes,
//! both in sequence, or nothing. Every completion hands out a
//! [`SignInAfterSignUpState`] so the new account can be signed in silently.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use signet_core::wire::RequiredAttribute;
use signet_core::{ApiErrorResponse, ChallengeResponse, ClientConfiguration, ContinuationResponse, RequestContext};
use signet_transport::{ApiRequest, AuthTransport, Endpoint};

use crate::api::{self, ApiFailure};
use crate::challenge::{self, ChallengeOutcome};
use crate::error::{
    messages, AttributesRequiredError, AttributesRequiredErrorKind, ErrorDescriptor,
    PasswordRequiredError, PasswordRequiredErrorKind, ResendCodeError, ResendCodeErrorKind,
    SignUpStartError, SignUpStartErrorKind, VerifyCodeError, VerifyCodeErrorKind,
};
use crate::state::{
    ChallengeChannel, SignInAfterSignUpState, SignUpAttributesRequiredState, SignUpCodeSentState,
    SignUpPasswordRequiredState,
};

/// Profile attributes supplied during sign-up, serialized as a JSON object on
/// the wire.
#[derive(Debug, Clone, Default)]
pub struct SignUpAttributes {
    values: BTreeMap<String, serde_json::Value>,
}

impl SignUpAttributes {
    /// An empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one attribute.
    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Whether no attributes are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn to_wire(&self) -> String {
        serde_json::to_string(&self.values).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Input of [`SignUpController::start`].
#[derive(Debug, Clone)]
pub struct SignUpParameters {
    username: String,
    password: Option<String>,
    attributes: Option<SignUpAttributes>,
}

impl SignUpParameters {
    /// Parameters for a sign-up.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            attributes: None,
        }
    }

    /// Supply the password up front.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Supply profile attributes up front.
    #[must_use]
    pub fn with_attributes(mut self, attributes: SignUpAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// The username to sign up.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Outcome of [`SignUpController::start`].
#[derive(Debug)]
pub enum SignUpStartOutcome {
    /// A verification code was sent; submit it next.
    CodeRequired {
        /// State for the submit-code step.
        state: SignUpCodeSentState,
        /// Masked label of the code target.
        sent_to: String,
        /// Delivery channel of the code.
        channel: ChallengeChannel,
        /// Length of the code that was sent.
        code_length: u32,
    },
    /// The flow could not be started.
    Error(SignUpStartError),
}

impl SignUpStartOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn SignUpStartDelegate) {
        match self {
            Self::CodeRequired {
                state,
                sent_to,
                channel,
                code_length,
            } => {
                delegate
                    .on_sign_up_code_required(state, sent_to, channel, code_length)
                    .await;
            }
            Self::Error(error) => delegate.on_sign_up_start_error(error).await,
        }
    }
}

/// Callback contract for [`SignUpController::start`].
#[async_trait]
pub trait SignUpStartDelegate: Send + Sync {
    /// A verification code was sent.
    async fn on_sign_up_code_required(
        &self,
        state: SignUpCodeSentState,
        sent_to: String,
        channel: ChallengeChannel,
        code_length: u32,
    );

    /// The flow could not be started.
    async fn on_sign_up_start_error(&self, error: SignUpStartError);
}

/// Outcome of [`SignUpController::submit_code`].
#[derive(Debug)]
pub enum SignUpVerifyCodeOutcome {
    /// The sign-up completed; the state signs the new account in silently.
    Completed(SignInAfterSignUpState),
    /// The server requires a password to create the account.
    PasswordRequired(SignUpPasswordRequiredState),
    /// The server requires further profile attributes.
    AttributesRequired {
        /// State for the submit-attributes step.
        state: SignUpAttributesRequiredState,
        /// The attributes the server requires.
        attributes: Vec<RequiredAttribute>,
    },
    /// The code was rejected. A wrong code carries a fresh state for one
    /// retry; terminal failures carry none.
    Error {
        /// Why the code was rejected.
        error: VerifyCodeError,
        /// Fresh state for a retry, when the failure is recoverable.
        new_state: Option<SignUpCodeSentState>,
    },
}

impl SignUpVerifyCodeOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn SignUpVerifyCodeDelegate) {
        match self {
            Self::Completed(state) => delegate.on_sign_up_completed(state).await,
            Self::PasswordRequired(state) => delegate.on_sign_up_password_required(state).await,
            Self::AttributesRequired { state, attributes } => {
                delegate.on_sign_up_attributes_required(state, attributes).await;
            }
            Self::Error { error, new_state } => {
                delegate.on_verify_code_error(error, new_state).await;
            }
        }
    }
}

/// Callback contract for [`SignUpController::submit_code`].
#[async_trait]
pub trait SignUpVerifyCodeDelegate: Send + Sync {
    /// The sign-up completed.
    async fn on_sign_up_completed(&self, state: SignInAfterSignUpState);

    /// A password must be submitted.
    async fn on_sign_up_password_required(&self, state: SignUpPasswordRequiredState);

    /// Further attributes must be submitted.
    async fn on_sign_up_attributes_required(
        &self,
        state: SignUpAttributesRequiredState,
        attributes: Vec<RequiredAttribute>,
    );

    /// The code was rejected.
    async fn on_verify_code_error(
        &self,
        error: VerifyCodeError,
        new_state: Option<SignUpCodeSentState>,
    );
}

/// Outcome of [`SignUpController::resend_code`].
#[derive(Debug)]
pub enum SignUpResendCodeOutcome {
    /// A fresh code was sent; the previous one is void.
    CodeRequired {
        /// State for the submit-code step.
        state: SignUpCodeSentState,
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

impl SignUpResendCodeOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn SignUpResendCodeDelegate) {
        match self {
            Self::CodeRequired {
                state,
                sent_to,
                channel,
                code_length,
            } => {
                delegate
                    .on_sign_up_resend_code_sent(state, sent_to, channel, code_length)
                    .await;
            }
            Self::Error(error) => delegate.on_sign_up_resend_code_error(error).await,
        }
    }
}

/// Callback contract for [`SignUpController::resend_code`].
#[async_trait]
pub trait SignUpResendCodeDelegate: Send + Sync {
    /// A fresh code was sent.
    async fn on_sign_up_resend_code_sent(
        &self,
        state: SignUpCodeSentState,
        sent_to: String,
        channel: ChallengeChannel,
        code_length: u32,
    );

    /// No new code could be sent.
    async fn on_sign_up_resend_code_error(&self, error: ResendCodeError);
}

/// Outcome of [`SignUpController::submit_password`].
#[derive(Debug)]
pub enum SignUpSubmitPasswordOutcome {
    /// The sign-up completed.
    Completed(SignInAfterSignUpState),
    /// The server requires further profile attributes.
    AttributesRequired {
        /// State for the submit-attributes step.
        state: SignUpAttributesRequiredState,
        /// The attributes the server requires.
        attributes: Vec<RequiredAttribute>,
    },
    /// The password was rejected. A policy violation carries a fresh state
    /// for one retry; terminal failures carry none.
    Error {
        /// Why the password was rejected.
        error: PasswordRequiredError,
        /// Fresh state for a retry, when the failure is recoverable.
        new_state: Option<SignUpPasswordRequiredState>,
    },
}

impl SignUpSubmitPasswordOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn SignUpPasswordRequiredDelegate) {
        match self {
            Self::Completed(state) => delegate.on_sign_up_completed(state).await,
            Self::AttributesRequired { state, attributes } => {
                delegate.on_sign_up_attributes_required(state, attributes).await;
            }
            Self::Error { error, new_state } => {
                delegate.on_password_required_error(error, new_state).await;
            }
        }
    }
}

/// Callback contract for [`SignUpController::submit_password`].
#[async_trait]
pub trait SignUpPasswordRequiredDelegate: Send + Sync {
    /// The sign-up completed.
    async fn on_sign_up_completed(&self, state: SignInAfterSignUpState);

    /// Further attributes must be submitted.
    async fn on_sign_up_attributes_required(
        &self,
        state: SignUpAttributesRequiredState,
        attributes: Vec<RequiredAttribute>,
    );

    /// The password was rejected.
    async fn on_password_required_error(
        &self,
        error: PasswordRequiredError,
        new_state: Option<SignUpPasswordRequiredState>,
    );
}

/// Outcome of [`SignUpController::submit_attributes`].
#[derive(Debug)]
pub enum SignUpAttributesRequiredOutcome {
    /// The sign-up completed.
    Completed(SignInAfterSignUpState),
    /// The server still requires further attributes.
    AttributesRequired {
        /// State for the next submit-attributes step.
        state: SignUpAttributesRequiredState,
        /// The attributes the server still requires.
        attributes: Vec<RequiredAttribute>,
    },
    /// The attributes were rejected. A validation failure carries a fresh
    /// state for one retry; terminal failures carry none.
    Error {
        /// Why the attributes were rejected.
        error: AttributesRequiredError,
        /// Fresh state for a retry, when the failure is recoverable.
        new_state: Option<SignUpAttributesRequiredState>,
    },
}

impl SignUpAttributesRequiredOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn SignUpAttributesRequiredDelegate) {
        match self {
            Self::Completed(state) => delegate.on_sign_up_completed(state).await,
            Self::AttributesRequired { state, attributes } => {
                delegate.on_sign_up_attributes_required(state, attributes).await;
            }
            Self::Error { error, new_state } => {
                delegate.on_attributes_required_error(error, new_state).await;
            }
        }
    }
}

/// Callback contract for [`SignUpController::submit_attributes`].
#[async_trait]
pub trait SignUpAttributesRequiredDelegate: Send + Sync {
    /// The sign-up completed.
    async fn on_sign_up_completed(&self, state: SignInAfterSignUpState);

    /// The server still requires further attributes.
    async fn on_sign_up_attributes_required(
        &self,
        state: SignUpAttributesRequiredState,
        attributes: Vec<RequiredAttribute>,
    );

    /// The attributes were rejected.
    async fn on_attributes_required_error(
        &self,
        error: AttributesRequiredError,
        new_state: Option<SignUpAttributesRequiredState>,
    );
}

/// Drives the sign-up flow.
pub struct SignUpController {
    transport: Arc<dyn AuthTransport>,
    config: Arc<ClientConfiguration>,
}

impl SignUpController {
    /// Build a controller over the given transport and configuration.
    #[must_use]
    pub fn new(transport: Arc<dyn AuthTransport>, config: Arc<ClientConfiguration>) -> Self {
        Self { transport, config }
    }

    /// Start a sign-up flow.
    pub async fn start(&self, parameters: SignUpParameters) -> SignUpStartOutcome {
        let context = RequestContext::new();
        tracing::debug!(
            correlation_id = %context.correlation_id(),
            username = parameters.username(),
            "Starting sign-up flow"
        );

        if parameters.username.trim().is_empty() {
            return SignUpStartOutcome::Error(SignUpStartError::new(
                SignUpStartErrorKind::InvalidUsername,
                ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
            ));
        }

        let request = ApiRequest::new(Endpoint::SignUpStart)
            .form("client_id", self.config.client_id())
            .form("challenge_type", self.config.challenge_types_value())
            .form("username", &parameters.username)
            .form_opt("password", parameters.password.as_deref())
            .form_opt(
                "attributes",
                parameters
                    .attributes
                    .as_ref()
                    .filter(|attributes| !attributes.is_empty())
                    .map(SignUpAttributes::to_wire),
            );

        let start: ChallengeResponse =
            match api::send_request(self.transport.as_ref(), request, &context).await {
                Ok(response) => response,
                Err(failure) => {
                    return SignUpStartOutcome::Error(Self::start_error(&failure, &context));
                }
            };

        if start.is_redirect() {
            return SignUpStartOutcome::Error(SignUpStartError::new(
                SignUpStartErrorKind::BrowserRequired,
                ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
            ));
        }
        let Some(continuation_token) = start.continuation_token else {
            return SignUpStartOutcome::Error(SignUpStartError::new(
                SignUpStartErrorKind::GeneralError,
                Self::unexpected(&context),
            ));
        };

        match challenge::request_challenge(
            self.transport.as_ref(),
            &self.config,
            Endpoint::SignUpChallenge,
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
            }) => SignUpStartOutcome::CodeRequired {
                state: SignUpCodeSentState::new(
                    continuation_token,
                    parameters.username.clone(),
                    context.correlation_id(),
                    sent_to.clone(),
                    channel,
                    code_length,
                ),
                sent_to,
                channel,
                code_length,
            },
            Ok(ChallengeOutcome::Redirect) => SignUpStartOutcome::Error(SignUpStartError::new(
                SignUpStartErrorKind::BrowserRequired,
                ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
            )),
            Ok(_) => SignUpStartOutcome::Error(SignUpStartError::new(
                SignUpStartErrorKind::GeneralError,
                Self::unexpected(&context),
            )),
            Err(failure) => SignUpStartOutcome::Error(Self::start_error(&failure, &context)),
        }
    }

    /// Submit the verification code that was sent to the user.
    pub async fn submit_code(
        &self,
        code: &str,
        state: &SignUpCodeSentState,
    ) -> SignUpVerifyCodeOutcome {
        let context = RequestContext::with_correlation_id(state.correlation_id());
        if !state.consume() {
            return SignUpVerifyCodeOutcome::Error {
                error: VerifyCodeError::new(
                    VerifyCodeErrorKind::GeneralError,
                    Self::invalid_state(&context),
                ),
                new_state: None,
            };
        }

        let request = ApiRequest::new(Endpoint::SignUpContinue)
            .form("client_id", self.config.client_id())
            .form("continuation_token", state.continuation_token())
            .form("grant_type", "oob")
            .form("oob", code);

        match api::send_request::<ContinuationResponse>(self.transport.as_ref(), request, &context)
            .await
        {
            Ok(response) => match response.continuation_token {
                Some(continuation_token) => {
                    SignUpVerifyCodeOutcome::Completed(SignInAfterSignUpState::new(
                        continuation_token,
                        state.username(),
                        context.correlation_id(),
                    ))
                }
                None => SignUpVerifyCodeOutcome::Error {
                    error: VerifyCodeError::new(
                        VerifyCodeErrorKind::GeneralError,
                        Self::unexpected(&context),
                    ),
                    new_state: None,
                },
            },
            Err(ApiFailure::Api(error)) if error.is_credential_required() => {
                self.password_challenge(&error, state, &context).await
            }
            Err(ApiFailure::Api(error)) if error.is_attributes_required() => {
                let (state, attributes) = Self::attributes_step(&error, state.username(), &context);
                SignUpVerifyCodeOutcome::AttributesRequired { state, attributes }
            }
            Err(ApiFailure::Api(error)) if error.is_invalid_oob() => {
                let continuation_token = error
                    .continuation_token
                    .clone()
                    .unwrap_or_else(|| state.continuation_token().to_string());
                let descriptor = ApiFailure::Api(error).descriptor(&context);
                SignUpVerifyCodeOutcome::Error {
                    error: VerifyCodeError::new(VerifyCodeErrorKind::InvalidCode, descriptor),
                    new_state: Some(SignUpCodeSentState::new(
                        continuation_token,
                        state.username(),
                        context.correlation_id(),
                        state.sent_to(),
                        state.channel(),
                        state.code_length(),
                    )),
                }
            }
            Err(failure) => {
                let kind = match &failure {
                    ApiFailure::Api(error) if error.is_redirect() => {
                        VerifyCodeErrorKind::BrowserRequired
                    }
                    _ => VerifyCodeErrorKind::GeneralError,
                };
                SignUpVerifyCodeOutcome::Error {
                    error: VerifyCodeError::new(kind, failure.descriptor(&context)),
                    new_state: None,
                }
            }
        }
    }

    /// The accepted code proved ownership but the account needs a password:
    /// ask the challenge endpoint to arm the password credential step.
    async fn password_challenge(
        &self,
        error: &ApiErrorResponse,
        state: &SignUpCodeSentState,
        context: &RequestContext,
    ) -> SignUpVerifyCodeOutcome {
        let Some(continuation_token) = error.continuation_token.clone() else {
            return SignUpVerifyCodeOutcome::Error {
                error: VerifyCodeError::new(
                    VerifyCodeErrorKind::GeneralError,
                    Self::unexpected(context),
                ),
                new_state: None,
            };
        };

        match challenge::request_challenge(
            self.transport.as_ref(),
            &self.config,
            Endpoint::SignUpChallenge,
            &continuation_token,
            context,
        )
        .await
        {
            Ok(ChallengeOutcome::PasswordRequired { continuation_token }) => {
                SignUpVerifyCodeOutcome::PasswordRequired(SignUpPasswordRequiredState::new(
                    continuation_token,
                    state.username(),
                    context.correlation_id(),
                ))
            }
            Ok(ChallengeOutcome::Redirect) => SignUpVerifyCodeOutcome::Error {
                error: VerifyCodeError::new(
                    VerifyCodeErrorKind::BrowserRequired,
                    ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
                ),
                new_state: None,
            },
            Ok(_) => SignUpVerifyCodeOutcome::Error {
                error: VerifyCodeError::new(
                    VerifyCodeErrorKind::GeneralError,
                    Self::unexpected(context),
                ),
                new_state: None,
            },
            Err(failure) => SignUpVerifyCodeOutcome::Error {
                error: VerifyCodeError::new(
                    VerifyCodeErrorKind::GeneralError,
                    failure.descriptor(context),
                ),
                new_state: None,
            },
        }
    }

    /// Request a fresh verification code for an in-flight flow.
    pub async fn resend_code(&self, state: &SignUpCodeSentState) -> SignUpResendCodeOutcome {
        let context = RequestContext::with_correlation_id(state.correlation_id());
        if !state.consume() {
            return SignUpResendCodeOutcome::Error(ResendCodeError::new(
                ResendCodeErrorKind::GeneralError,
                Self::invalid_state(&context),
            ));
        }

        match challenge::request_challenge(
            self.transport.as_ref(),
            &self.config,
            Endpoint::SignUpChallenge,
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
            }) => SignUpResendCodeOutcome::CodeRequired {
                state: SignUpCodeSentState::new(
                    continuation_token,
                    state.username(),
                    context.correlation_id(),
                    sent_to.clone(),
                    channel,
                    code_length,
                ),
                sent_to,
                channel,
                code_length,
            },
            Ok(ChallengeOutcome::Redirect) => SignUpResendCodeOutcome::Error(ResendCodeError::new(
                ResendCodeErrorKind::BrowserRequired,
                ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
            )),
            Ok(_) => SignUpResendCodeOutcome::Error(ResendCodeError::new(
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
                SignUpResendCodeOutcome::Error(ResendCodeError::new(
                    kind,
                    failure.descriptor(&context),
                ))
            }
        }
    }

    /// Submit the password for the account being created.
    pub async fn submit_password(
        &self,
        password: &str,
        state: &SignUpPasswordRequiredState,
    ) -> SignUpSubmitPasswordOutcome {
        let context = RequestContext::with_correlation_id(state.correlation_id());
        if !state.consume() {
            return SignUpSubmitPasswordOutcome::Error {
                error: PasswordRequiredError::new(
                    PasswordRequiredErrorKind::GeneralError,
                    Self::invalid_state(&context),
                ),
                new_state: None,
            };
        }

        let request = ApiRequest::new(Endpoint::SignUpContinue)
            .form("client_id", self.config.client_id())
            .form("continuation_token", state.continuation_token())
            .form("grant_type", "password")
            .form("password", password);

        match api::send_request::<ContinuationResponse>(self.transport.as_ref(), request, &context)
            .await
        {
            Ok(response) => match response.continuation_token {
                Some(continuation_token) => {
                    SignUpSubmitPasswordOutcome::Completed(SignInAfterSignUpState::new(
                        continuation_token,
                        state.username(),
                        context.correlation_id(),
                    ))
                }
                None => SignUpSubmitPasswordOutcome::Error {
                    error: PasswordRequiredError::new(
                        PasswordRequiredErrorKind::GeneralError,
                        Self::unexpected(&context),
                    ),
                    new_state: None,
                },
            },
            Err(ApiFailure::Api(error)) if error.is_attributes_required() => {
                let (state, attributes) = Self::attributes_step(&error, state.username(), &context);
                SignUpSubmitPasswordOutcome::AttributesRequired { state, attributes }
            }
            Err(ApiFailure::Api(error)) if error.is_password_policy_violation() => {
                let continuation_token = error
                    .continuation_token
                    .clone()
                    .unwrap_or_else(|| state.continuation_token().to_string());
                let descriptor = ApiFailure::Api(error).descriptor(&context);
                SignUpSubmitPasswordOutcome::Error {
                    error: PasswordRequiredError::new(
                        PasswordRequiredErrorKind::InvalidPassword,
                        descriptor,
                    ),
                    new_state: Some(SignUpPasswordRequiredState::new(
                        continuation_token,
                        state.username(),
                        context.correlation_id(),
                    )),
                }
            }
            Err(failure) => {
                let kind = match &failure {
                    ApiFailure::Api(error) if error.is_redirect() => {
                        PasswordRequiredErrorKind::BrowserRequired
                    }
                    _ => PasswordRequiredErrorKind::GeneralError,
                };
                SignUpSubmitPasswordOutcome::Error {
                    error: PasswordRequiredError::new(kind, failure.descriptor(&context)),
                    new_state: None,
                }
            }
        }
    }

    /// Submit the profile attributes the server asked for.
    pub async fn submit_attributes(
        &self,
        attributes: SignUpAttributes,
        state: &SignUpAttributesRequiredState,
    ) -> SignUpAttributesRequiredOutcome {
        let context = RequestContext::with_correlation_id(state.correlation_id());
        if !state.consume() {
            return SignUpAttributesRequiredOutcome::Error {
                error: AttributesRequiredError::new(
                    AttributesRequiredErrorKind::GeneralError,
                    Self::invalid_state(&context),
                ),
                new_state: None,
            };
        }

        let request = ApiRequest::new(Endpoint::SignUpContinue)
            .form("client_id", self.config.client_id())
            .form("continuation_token", state.continuation_token())
            .form("grant_type", "attributes")
            .form("attributes", attributes.to_wire());

        match api::send_request::<ContinuationResponse>(self.transport.as_ref(), request, &context)
            .await
        {
            Ok(response) => match response.continuation_token {
                Some(continuation_token) => {
                    SignUpAttributesRequiredOutcome::Completed(SignInAfterSignUpState::new(
                        continuation_token,
                        state.username(),
                        context.correlation_id(),
                    ))
                }
                None => SignUpAttributesRequiredOutcome::Error {
                    error: AttributesRequiredError::new(
                        AttributesRequiredErrorKind::GeneralError,
                        Self::unexpected(&context),
                    ),
                    new_state: None,
                },
            },
            Err(ApiFailure::Api(error)) if error.is_attributes_required() => {
                let (state, attributes) = Self::attributes_step(&error, state.username(), &context);
                SignUpAttributesRequiredOutcome::AttributesRequired { state, attributes }
            }
            Err(ApiFailure::Api(error)) if error.is_attribute_validation_failed() => {
                let continuation_token = error
                    .continuation_token
                    .clone()
                    .unwrap_or_else(|| state.continuation_token().to_string());
                let required = error
                    .required_attributes
                    .clone()
                    .unwrap_or_else(|| state.required_attributes().to_vec());
                let descriptor = ApiFailure::Api(error).descriptor(&context);
                SignUpAttributesRequiredOutcome::Error {
                    error: AttributesRequiredError::new(
                        AttributesRequiredErrorKind::InvalidAttributes,
                        descriptor,
                    ),
                    new_state: Some(SignUpAttributesRequiredState::new(
                        continuation_token,
                        state.username(),
                        context.correlation_id(),
                        required,
                    )),
                }
            }
            Err(failure) => {
                let kind = match &failure {
                    ApiFailure::Api(error) if error.is_redirect() => {
                        AttributesRequiredErrorKind::BrowserRequired
                    }
                    _ => AttributesRequiredErrorKind::GeneralError,
                };
                SignUpAttributesRequiredOutcome::Error {
                    error: AttributesRequiredError::new(kind, failure.descriptor(&context)),
                    new_state: None,
                }
            }
        }
    }

    fn attributes_step(
        error: &ApiErrorResponse,
        username: &str,
        context: &RequestContext,
    ) -> (SignUpAttributesRequiredState, Vec<RequiredAttribute>) {
        let attributes = error.required_attributes.clone().unwrap_or_default();
        let state = SignUpAttributesRequiredState::new(
            error.continuation_token.clone().unwrap_or_default(),
            username,
            context.correlation_id(),
            attributes.clone(),
        );
        (state, attributes)
    }

    fn start_error(failure: &ApiFailure, context: &RequestContext) -> SignUpStartError {
        let kind = match failure {
            ApiFailure::Api(error) if error.is_redirect() => SignUpStartErrorKind::BrowserRequired,
            ApiFailure::Api(error) if error.is_user_already_exists() => {
                SignUpStartErrorKind::UserAlreadyExists
            }
            ApiFailure::Api(error) if error.is_password_policy_violation() => {
                SignUpStartErrorKind::InvalidPassword
            }
            ApiFailure::Api(error) if error.is_attribute_validation_failed() => {
                SignUpStartErrorKind::InvalidAttributes
            }
            _ => SignUpStartErrorKind::GeneralError,
        };
        SignUpStartError::new(kind, failure.descriptor(context))
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
    use signet_transport::MockTransport;

    const OOB_CHALLENGE: &str = r#"{
        "challenge_type": "oob",
        "continuation_token": "ct-oob",
        "challenge_target_label": "u***@contoso.com",
        "challenge_channel": "email",
        "code_length": 8
    }"#;

    fn controller(transport: MockTransport) -> SignUpController {
        let config = ClientConfiguration::new("client-1", "https://contoso.ciamlogin.com/contoso")
            .unwrap();
        SignUpController::new(Arc::new(transport), Arc::new(config))
    }

    async fn code_sent(transport: MockTransport) -> (SignUpController, SignUpCodeSentState) {
        let starter = controller(
            MockTransport::new()
                .with_json(200, r#"{"continuation_token":"ct-start"}"#)
                .with_json(200, OOB_CHALLENGE),
        );
        let state = match starter.start(SignUpParameters::new("new@contoso.com")).await {
            SignUpStartOutcome::CodeRequired { state, .. } => state,
            SignUpStartOutcome::Error(error) => panic!("start failed: {error}"),
        };
        (controller(transport), state)
    }

    #[tokio::test]
    async fn test_start_sends_attributes_on_the_wire() {
        let transport = MockTransport::new()
            .with_json(200, r#"{"continuation_token":"ct-start"}"#)
            .with_json(200, OOB_CHALLENGE);
        let observer = transport.clone();
        let controller = controller(transport);

        let parameters = SignUpParameters::new("new@contoso.com")
            .with_password("S3cure-Pass!")
            .with_attributes(SignUpAttributes::new().with("displayName", "New User"));
        match controller.start(parameters).await {
            SignUpStartOutcome::CodeRequired { sent_to, .. } => {
                assert_eq!(sent_to, "u***@contoso.com");
            }
            SignUpStartOutcome::Error(error) => panic!("start failed: {error}"),
        }

        let recorded = observer.recorded_requests();
        assert_eq!(recorded[0].endpoint(), Endpoint::SignUpStart);
        assert_eq!(
            recorded[0].form_value("attributes"),
            Some(r#"{"displayName":"New User"}"#)
        );
        assert_eq!(recorded[0].form_value("password"), Some("S3cure-Pass!"));
    }

    #[tokio::test]
    async fn test_start_maps_user_already_exists() {
        let transport = MockTransport::new().with_json(
            400,
            r#"{"error":"user_already_exists","error_description":"Account exists."}"#,
        );
        let controller = controller(transport);

        match controller.start(SignUpParameters::new("old@contoso.com")).await {
            SignUpStartOutcome::Error(error) => {
                assert!(error.is_user_already_exists());
                assert_eq!(error.message(), "Account exists.");
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_code_completes_with_sign_in_state() {
        let (controller, state) =
            code_sent(MockTransport::new().with_json(200, r#"{"continuation_token":"ct-done"}"#))
                .await;

        match controller.submit_code("123456", &state).await {
            SignUpVerifyCodeOutcome::Completed(sign_in_state) => {
                assert_eq!(sign_in_state.username(), "new@contoso.com");
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_credential_required_leads_to_password_step() {
        let (controller, state) = code_sent(
            MockTransport::new()
                .with_json(
                    400,
                    r#"{"error":"invalid_grant","suberror":"credential_required","continuation_token":"ct-cred"}"#,
                )
                .with_json(200, r#"{"challenge_type":"password","continuation_token":"ct-pw"}"#),
        )
        .await;

        match controller.submit_code("123456", &state).await {
            SignUpVerifyCodeOutcome::PasswordRequired(password_state) => {
                assert_eq!(password_state.username(), "new@contoso.com");
            }
            other => panic!("expected password required, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_attributes_required_after_password() {
        let (controller, state) = code_sent(
            MockTransport::new()
                .with_json(
                    400,
                    r#"{"error":"invalid_grant","suberror":"credential_required","continuation_token":"ct-cred"}"#,
                )
                .with_json(200, r#"{"challenge_type":"password","continuation_token":"ct-pw"}"#)
                .with_json(
                    400,
                    r#"{
                        "error": "invalid_grant",
                        "suberror": "attributes_required",
                        "continuation_token": "ct-attr",
                        "required_attributes": [
                            {"name": "displayName", "type": "string", "required": true}
                        ]
                    }"#,
                )
                .with_json(200, r#"{"continuation_token":"ct-done"}"#),
        )
        .await;

        let password_state = match controller.submit_code("123456", &state).await {
            SignUpVerifyCodeOutcome::PasswordRequired(password_state) => password_state,
            other => panic!("expected password required, got {other:?}"),
        };

        let attributes_state = match controller
            .submit_password("S3cure-Pass!", &password_state)
            .await
        {
            SignUpSubmitPasswordOutcome::AttributesRequired { state, attributes } => {
                assert_eq!(attributes.len(), 1);
                assert_eq!(attributes[0].name, "displayName");
                state
            }
            other => panic!("expected attributes required, got {other:?}"),
        };

        match controller
            .submit_attributes(
                SignUpAttributes::new().with("displayName", "New User"),
                &attributes_state,
            )
            .await
        {
            SignUpAttributesRequiredOutcome::Completed(sign_in_state) => {
                assert_eq!(sign_in_state.username(), "new@contoso.com");
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_code_is_recoverable() {
        let (controller, state) = code_sent(MockTransport::new().with_json(
            400,
            r#"{"error":"invalid_grant","suberror":"invalid_oob_value","continuation_token":"ct-retry"}"#,
        ))
        .await;

        match controller.submit_code("000000", &state).await {
            SignUpVerifyCodeOutcome::Error { error, new_state } => {
                assert!(error.is_invalid_code());
                assert!(new_state.is_some());
            }
            other => panic!("expected recoverable error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_attribute_validation_failure_is_recoverable() {
        let (starter, state) = code_sent(MockTransport::new().with_json(
            400,
            r#"{
                "error": "invalid_grant",
                "suberror": "attributes_required",
                "continuation_token": "ct-attr",
                "required_attributes": [{"name": "city", "required": true}]
            }"#,
        ))
        .await;

        let attributes_state = match starter.submit_code("123456", &state).await {
            SignUpVerifyCodeOutcome::AttributesRequired { state, .. } => state,
            other => panic!("expected attributes required, got {other:?}"),
        };

        let controller = controller(MockTransport::new().with_json(
            400,
            r#"{
                "error": "invalid_grant",
                "suberror": "attribute_validation_failed",
                "error_description": "city must not be empty",
                "continuation_token": "ct-attr-2"
            }"#,
        ));

        match controller
            .submit_attributes(SignUpAttributes::new().with("city", ""), &attributes_state)
            .await
        {
            SignUpAttributesRequiredOutcome::Error { error, new_state } => {
                assert!(error.is_invalid_attributes());
                let new_state = new_state.expect("validation failure must carry a fresh state");
                assert_eq!(new_state.required_attributes()[0].name, "city");
            }
            other => panic!("expected recoverable error, got {other:?}"),
        }
    }
}
