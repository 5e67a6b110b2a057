//! The reset-password flow.
//!
//! Four steps: `start` sends a one-time code, `submit_code` proves ownership,
//! `submit_password` applies the new password, `resend_code` requests a fresh
//! code in between. Recoverable failures (wrong code, rejected password)
//! deliver a fresh state next to the error so the caller retries the same
//! step; everything else is terminal.

use std::sync::Arc;

use async_trait::async_trait;
use signet_core::{
    ChallengeResponse, ClientConfiguration, ContinuationResponse, PollCompletionResponse,
    PollStatus, RequestContext,
};
use signet_transport::{ApiRequest, AuthTransport, Endpoint};

use crate::api::{self, ApiFailure};
use crate::challenge::{self, ChallengeOutcome};
use crate::error::{
    messages, ErrorDescriptor, PasswordRequiredError, PasswordRequiredErrorKind, ResendCodeError,
    ResendCodeErrorKind, ResetPasswordStartError, ResetPasswordStartErrorKind, VerifyCodeError,
    VerifyCodeErrorKind,
};
use crate::state::{ChallengeChannel, ResetPasswordCodeSentState, ResetPasswordRequiredState};

/// Outcome of [`ResetPasswordController::start`].
#[derive(Debug)]
pub enum ResetPasswordStartOutcome {
    /// A one-time code was sent; submit it next.
    CodeSent {
        /// State for the submit-code step.
        state: ResetPasswordCodeSentState,
        /// Masked label of the code target.
        sent_to: String,
        /// Delivery channel of the code.
        channel: ChallengeChannel,
        /// Length of the code that was sent.
        code_length: u32,
    },
    /// The flow could not be started.
    Error(ResetPasswordStartError),
}

impl ResetPasswordStartOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn ResetPasswordStartDelegate) {
        match self {
            Self::CodeSent {
                state,
                sent_to,
                channel,
                code_length,
            } => {
                delegate
                    .on_reset_password_code_sent(state, sent_to, channel, code_length)
                    .await;
            }
            Self::Error(error) => delegate.on_reset_password_start_error(error).await,
        }
    }
}

/// Callback contract for [`ResetPasswordController::start`].
#[async_trait]
pub trait ResetPasswordStartDelegate: Send + Sync {
    /// A one-time code was sent.
    async fn on_reset_password_code_sent(
        &self,
        state: ResetPasswordCodeSentState,
        sent_to: String,
        channel: ChallengeChannel,
        code_length: u32,
    );

    /// The flow could not be started.
    async fn on_reset_password_start_error(&self, error: ResetPasswordStartError);
}

/// Outcome of [`ResetPasswordController::resend_code`].
#[derive(Debug)]
pub enum ResetPasswordResendCodeOutcome {
    /// A fresh code was sent; the previous one is void.
    CodeSent {
        /// State for the submit-code step.
        state: ResetPasswordCodeSentState,
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

impl ResetPasswordResendCodeOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn ResetPasswordResendCodeDelegate) {
        match self {
            Self::CodeSent {
                state,
                sent_to,
                channel,
                code_length,
            } => {
                delegate
                    .on_reset_password_resend_code_sent(state, sent_to, channel, code_length)
                    .await;
            }
            Self::Error(error) => delegate.on_reset_password_resend_code_error(error).await,
        }
    }
}

/// Callback contract for [`ResetPasswordController::resend_code`].
#[async_trait]
pub trait ResetPasswordResendCodeDelegate: Send + Sync {
    /// A fresh code was sent.
    async fn on_reset_password_resend_code_sent(
        &self,
        state: ResetPasswordCodeSentState,
        sent_to: String,
        channel: ChallengeChannel,
        code_length: u32,
    );

    /// No new code could be sent.
    async fn on_reset_password_resend_code_error(&self, error: ResendCodeError);
}

/// Outcome of [`ResetPasswordController::submit_code`].
#[derive(Debug)]
pub enum ResetPasswordVerifyCodeOutcome {
    /// The code was accepted; submit the new password next.
    PasswordRequired(ResetPasswordRequiredState),
    /// The code was rejected. A wrong code carries a fresh state for one
    /// retry; terminal failures carry none.
    Error {
        /// Why the code was rejected.
        error: VerifyCodeError,
        /// Fresh state for a retry, when the failure is recoverable.
        new_state: Option<ResetPasswordCodeSentState>,
    },
}

impl ResetPasswordVerifyCodeOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn ResetPasswordVerifyCodeDelegate) {
        match self {
            Self::PasswordRequired(state) => delegate.on_password_required(state).await,
            Self::Error { error, new_state } => {
                delegate.on_verify_code_error(error, new_state).await;
            }
        }
    }
}

/// Callback contract for [`ResetPasswordController::submit_code`].
#[async_trait]
pub trait ResetPasswordVerifyCodeDelegate: Send + Sync {
    /// The code was accepted.
    async fn on_password_required(&self, state: ResetPasswordRequiredState);

    /// The code was rejected.
    async fn on_verify_code_error(
        &self,
        error: VerifyCodeError,
        new_state: Option<ResetPasswordCodeSentState>,
    );
}

/// Outcome of [`ResetPasswordController::submit_password`].
#[derive(Debug)]
pub enum ResetPasswordSubmitOutcome {
    /// The password change completed.
    Completed,
    /// The password was rejected. A policy violation carries a fresh state
    /// for one retry; terminal failures carry none.
    Error {
        /// Why the password was rejected.
        error: PasswordRequiredError,
        /// Fresh state for a retry, when the failure is recoverable.
        new_state: Option<ResetPasswordRequiredState>,
    },
}

impl ResetPasswordSubmitOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn ResetPasswordRequiredDelegate) {
        match self {
            Self::Completed => delegate.on_reset_password_completed().await,
            Self::Error { error, new_state } => {
                delegate.on_password_required_error(error, new_state).await;
            }
        }
    }
}

/// Callback contract for [`ResetPasswordController::submit_password`].
#[async_trait]
pub trait ResetPasswordRequiredDelegate: Send + Sync {
    /// The password change completed.
    async fn on_reset_password_completed(&self);

    /// The password was rejected.
    async fn on_password_required_error(
        &self,
        error: PasswordRequiredError,
        new_state: Option<ResetPasswordRequiredState>,
    );
}

/// Drives the reset-password flow.
pub struct ResetPasswordController {
    transport: Arc<dyn AuthTransport>,
    config: Arc<ClientConfiguration>,
}

impl ResetPasswordController {
    /// Build a controller over the given transport and configuration.
    #[must_use]
    pub fn new(transport: Arc<dyn AuthTransport>, config: Arc<ClientConfiguration>) -> Self {
        Self { transport, config }
    }

    /// Start a reset-password flow for the given username.
    pub async fn start(&self, username: &str) -> ResetPasswordStartOutcome {
        let context = RequestContext::new();
        tracing::debug!(
            correlation_id = %context.correlation_id(),
            "Starting reset-password flow"
        );

        if username.trim().is_empty() {
            return ResetPasswordStartOutcome::Error(ResetPasswordStartError::new(
                ResetPasswordStartErrorKind::InvalidUsername,
                ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
            ));
        }

        let request = ApiRequest::new(Endpoint::ResetPasswordStart)
            .form("client_id", self.config.client_id())
            .form("challenge_type", self.config.challenge_types_value())
            .form("username", username);

        let start: ChallengeResponse =
            match api::send_request(self.transport.as_ref(), request, &context).await {
                Ok(response) => response,
                Err(failure) => {
                    return ResetPasswordStartOutcome::Error(Self::start_error(&failure, &context));
                }
            };

        if start.is_redirect() {
            return ResetPasswordStartOutcome::Error(ResetPasswordStartError::new(
                ResetPasswordStartErrorKind::BrowserRequired,
                ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
            ));
        }
        let Some(continuation_token) = start.continuation_token else {
            return ResetPasswordStartOutcome::Error(ResetPasswordStartError::new(
                ResetPasswordStartErrorKind::GeneralError,
                Self::unexpected(&context),
            ));
        };

        match challenge::request_challenge(
            self.transport.as_ref(),
            &self.config,
            Endpoint::ResetPasswordChallenge,
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
            }) => ResetPasswordStartOutcome::CodeSent {
                state: ResetPasswordCodeSentState::new(
                    continuation_token,
                    username,
                    context.correlation_id(),
                    sent_to.clone(),
                    channel,
                    code_length,
                ),
                sent_to,
                channel,
                code_length,
            },
            Ok(ChallengeOutcome::Redirect) => {
                ResetPasswordStartOutcome::Error(ResetPasswordStartError::new(
                    ResetPasswordStartErrorKind::BrowserRequired,
                    ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
                ))
            }
            Ok(_) => ResetPasswordStartOutcome::Error(ResetPasswordStartError::new(
                ResetPasswordStartErrorKind::GeneralError,
                Self::unexpected(&context),
            )),
            Err(failure) => {
                ResetPasswordStartOutcome::Error(Self::start_error(&failure, &context))
            }
        }
    }

    /// Request a fresh one-time code for an in-flight flow.
    pub async fn resend_code(
        &self,
        state: &ResetPasswordCodeSentState,
    ) -> ResetPasswordResendCodeOutcome {
        let context = RequestContext::with_correlation_id(state.correlation_id());
        if !state.consume() {
            return ResetPasswordResendCodeOutcome::Error(ResendCodeError::new(
                ResendCodeErrorKind::GeneralError,
                Self::invalid_state(&context),
            ));
        }

        match challenge::request_challenge(
            self.transport.as_ref(),
            &self.config,
            Endpoint::ResetPasswordChallenge,
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
            }) => ResetPasswordResendCodeOutcome::CodeSent {
                state: ResetPasswordCodeSentState::new(
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
            Ok(ChallengeOutcome::Redirect) => {
                ResetPasswordResendCodeOutcome::Error(ResendCodeError::new(
                    ResendCodeErrorKind::BrowserRequired,
                    ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
                ))
            }
            Ok(_) => ResetPasswordResendCodeOutcome::Error(ResendCodeError::new(
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
                ResetPasswordResendCodeOutcome::Error(ResendCodeError::new(
                    kind,
                    failure.descriptor(&context),
                ))
            }
        }
    }

    /// Submit the one-time code that was sent to the user.
    pub async fn submit_code(
        &self,
        code: &str,
        state: &ResetPasswordCodeSentState,
    ) -> ResetPasswordVerifyCodeOutcome {
        let context = RequestContext::with_correlation_id(state.correlation_id());
        if !state.consume() {
            return ResetPasswordVerifyCodeOutcome::Error {
                error: VerifyCodeError::new(
                    VerifyCodeErrorKind::GeneralError,
                    Self::invalid_state(&context),
                ),
                new_state: None,
            };
        }

        let request = ApiRequest::new(Endpoint::ResetPasswordContinue)
            .form("client_id", self.config.client_id())
            .form("continuation_token", state.continuation_token())
            .form("grant_type", "oob")
            .form("oob", code);

        match api::send_request::<ContinuationResponse>(self.transport.as_ref(), request, &context)
            .await
        {
            Ok(response) => match response.continuation_token {
                Some(continuation_token) => ResetPasswordVerifyCodeOutcome::PasswordRequired(
                    ResetPasswordRequiredState::new(
                        continuation_token,
                        state.username(),
                        context.correlation_id(),
                    ),
                ),
                None => ResetPasswordVerifyCodeOutcome::Error {
                    error: VerifyCodeError::new(
                        VerifyCodeErrorKind::GeneralError,
                        Self::unexpected(&context),
                    ),
                    new_state: None,
                },
            },
            Err(ApiFailure::Api(error)) if error.is_invalid_oob() => {
                let continuation_token = error
                    .continuation_token
                    .clone()
                    .unwrap_or_else(|| state.continuation_token().to_string());
                let descriptor = ApiFailure::Api(error).descriptor(&context);
                ResetPasswordVerifyCodeOutcome::Error {
                    error: VerifyCodeError::new(VerifyCodeErrorKind::InvalidCode, descriptor),
                    new_state: Some(ResetPasswordCodeSentState::new(
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
                ResetPasswordVerifyCodeOutcome::Error {
                    error: VerifyCodeError::new(kind, failure.descriptor(&context)),
                    new_state: None,
                }
            }
        }
    }

    /// Submit the new password.
    pub async fn submit_password(
        &self,
        password: &str,
        state: &ResetPasswordRequiredState,
    ) -> ResetPasswordSubmitOutcome {
        let context = RequestContext::with_correlation_id(state.correlation_id());
        if !state.consume() {
            return ResetPasswordSubmitOutcome::Error {
                error: PasswordRequiredError::new(
                    PasswordRequiredErrorKind::GeneralError,
                    Self::invalid_state(&context),
                ),
                new_state: None,
            };
        }

        let request = ApiRequest::new(Endpoint::ResetPasswordSubmit)
            .form("client_id", self.config.client_id())
            .form("continuation_token", state.continuation_token())
            .form("new_password", password);

        let submitted = match api::send_request::<ContinuationResponse>(
            self.transport.as_ref(),
            request,
            &context,
        )
        .await
        {
            Ok(response) => response,
            Err(ApiFailure::Api(error)) if error.is_password_policy_violation() => {
                let continuation_token = error
                    .continuation_token
                    .clone()
                    .unwrap_or_else(|| state.continuation_token().to_string());
                let descriptor = ApiFailure::Api(error).descriptor(&context);
                return ResetPasswordSubmitOutcome::Error {
                    error: PasswordRequiredError::new(
                        PasswordRequiredErrorKind::InvalidPassword,
                        descriptor,
                    ),
                    new_state: Some(ResetPasswordRequiredState::new(
                        continuation_token,
                        state.username(),
                        context.correlation_id(),
                    )),
                };
            }
            Err(failure) => {
                let kind = match &failure {
                    ApiFailure::Api(error) if error.is_redirect() => {
                        PasswordRequiredErrorKind::BrowserRequired
                    }
                    _ => PasswordRequiredErrorKind::GeneralError,
                };
                return ResetPasswordSubmitOutcome::Error {
                    error: PasswordRequiredError::new(kind, failure.descriptor(&context)),
                    new_state: None,
                };
            }
        };

        let Some(poll_token) = submitted.continuation_token else {
            return ResetPasswordSubmitOutcome::Error {
                error: PasswordRequiredError::new(
                    PasswordRequiredErrorKind::GeneralError,
                    Self::unexpected(&context),
                ),
                new_state: None,
            };
        };

        self.poll_completion(&poll_token, state, &context).await
    }

    /// One completion poll round-trip. Poll cadence belongs to the caller;
    /// an in-progress answer surfaces as a retryable error with a fresh state.
    async fn poll_completion(
        &self,
        poll_token: &str,
        state: &ResetPasswordRequiredState,
        context: &RequestContext,
    ) -> ResetPasswordSubmitOutcome {
        let request = ApiRequest::new(Endpoint::ResetPasswordPollCompletion)
            .form("client_id", self.config.client_id())
            .form("continuation_token", poll_token);

        match api::send_request::<PollCompletionResponse>(
            self.transport.as_ref(),
            request,
            context,
        )
        .await
        {
            Ok(response) => match response.status {
                PollStatus::Succeeded => ResetPasswordSubmitOutcome::Completed,
                PollStatus::Failed => ResetPasswordSubmitOutcome::Error {
                    error: PasswordRequiredError::new(
                        PasswordRequiredErrorKind::GeneralError,
                        ErrorDescriptor::new()
                            .with_correlation_id(context.correlation_id())
                            .with_message("The password change failed on the server."),
                    ),
                    new_state: None,
                },
                PollStatus::InProgress | PollStatus::NotStarted => {
                    ResetPasswordSubmitOutcome::Error {
                        error: PasswordRequiredError::new(
                            PasswordRequiredErrorKind::GeneralError,
                            ErrorDescriptor::new()
                                .with_correlation_id(context.correlation_id())
                                .with_message(
                                    "The password change has not completed yet; try again.",
                                ),
                        ),
                        new_state: Some(ResetPasswordRequiredState::new(
                            poll_token,
                            state.username(),
                            context.correlation_id(),
                        )),
                    }
                }
            },
            Err(failure) => ResetPasswordSubmitOutcome::Error {
                error: PasswordRequiredError::new(
                    PasswordRequiredErrorKind::GeneralError,
                    failure.descriptor(context),
                ),
                new_state: None,
            },
        }
    }

    fn start_error(failure: &ApiFailure, context: &RequestContext) -> ResetPasswordStartError {
        let kind = match failure {
            ApiFailure::Api(error) if error.is_redirect() => {
                ResetPasswordStartErrorKind::BrowserRequired
            }
            ApiFailure::Api(error) if error.is_user_not_found() => {
                ResetPasswordStartErrorKind::UserNotFound
            }
            ApiFailure::Api(error) if error.is_user_does_not_have_password() => {
                ResetPasswordStartErrorKind::UserDoesNotHavePassword
            }
            _ => ResetPasswordStartErrorKind::GeneralError,
        };
        ResetPasswordStartError::new(kind, failure.descriptor(context))
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
