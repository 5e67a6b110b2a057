//! # signet
//!
//! signet is the client engine of a native identity authentication SDK: it
//! drives multi-step OAuth2/OIDC-style flows (sign-in, sign-up, password
//! reset, code verification, token refresh, sign-out) entirely through typed
//! in-process state transitions, without a browser redirect.
//!
//! Every flow step returns exactly one typed outcome: a terminal success, a
//! terminal error from a closed per-operation taxonomy, or an immutable state
//! object the caller acts on next. Outcomes can be matched directly or
//! dispatched to a delegate, which is invoked exactly once.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use signet::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfiguration::new(
//!         "1f98a992-3b0a-4bbd-8ad9-97b0565aa930",
//!         "https://contoso.ciamlogin.com/contoso.onmicrosoft.com",
//!     )?
//!     .with_scopes(["openid", "offline_access"]);
//!
//!     let client = NativeAuthClient::new(config);
//!
//!     let parameters = SignInParameters::new("user@contoso.com").with_password("hunter2");
//!     match client.sign_in(parameters).await {
//!         SignInStartOutcome::Completed(account) => {
//!             println!("signed in as {}", account.username());
//!         }
//!         SignInStartOutcome::CodeRequired { sent_to, .. } => {
//!             println!("enter the code sent to {sent_to}");
//!         }
//!         SignInStartOutcome::PasswordRequired(_) => println!("password required"),
//!         SignInStartOutcome::Error(error) => eprintln!("sign-in failed: {error}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! signet is organized as a workspace of focused crates:
//!
//! - [`signet_core`] - configuration, wire payloads, server error codes, and
//!   the account/token data model
//! - [`signet_transport`] - the transport seam: [`AuthTransport`], the
//!   `reqwest`-backed [`HttpTransport`], and [`MockTransport`] for tests
//! - [`signet_flows`] - the token-response validator, flow states,
//!   controllers, delegates, and the public error types
//!
//! This crate re-exports the public surface and adds [`NativeAuthClient`],
//! which wires the controllers over one shared transport and configuration.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

mod client;

pub use client::NativeAuthClient;

pub use signet_core::{
    Account, AccountIdentifier, AccountResult, ChallengeType, ClientConfiguration,
    ConfigurationError, IdTokenClaims, RequestContext, RequiredAttribute, TokenResult,
};
pub use signet_flows::{
    AccessToken, AttributesRequiredError, ChallengeChannel, CredentialStore,
    CredentialsController, ErrorDescriptor, InMemoryCredentialStore, PasswordRequiredError,
    ResendCodeError, ResetPasswordCodeSentState, ResetPasswordController,
    ResetPasswordRequiredDelegate, ResetPasswordRequiredState, ResetPasswordResendCodeDelegate,
    ResetPasswordResendCodeOutcome, ResetPasswordStartDelegate, ResetPasswordStartError,
    ResetPasswordStartOutcome, ResetPasswordSubmitOutcome, ResetPasswordVerifyCodeDelegate,
    ResetPasswordVerifyCodeOutcome, RetrieveAccessTokenDelegate, RetrieveAccessTokenError,
    RetrieveAccessTokenOutcome, SignInAfterSignUpDelegate, SignInAfterSignUpError,
    SignInAfterSignUpOutcome, SignInAfterSignUpState, SignInCodeSentState, SignInController,
    SignInParameters, SignInPasswordRequiredDelegate, SignInPasswordRequiredState,
    SignInResendCodeDelegate, SignInResendCodeOutcome, SignInStartDelegate, SignInStartError,
    SignInStartOutcome, SignInSubmitPasswordOutcome, SignInVerifyCodeDelegate,
    SignInVerifyCodeOutcome, SignOutDelegate, SignOutError, SignOutOutcome, SignUpAttributes,
    SignUpAttributesRequiredDelegate, SignUpAttributesRequiredOutcome,
    SignUpAttributesRequiredState, SignUpCodeSentState, SignUpController, SignUpParameters,
    SignUpPasswordRequiredDelegate, SignUpPasswordRequiredState, SignUpResendCodeDelegate,
    SignUpResendCodeOutcome, SignUpStartDelegate, SignUpStartError, SignUpStartOutcome,
    SignUpSubmitPasswordOutcome, SignUpVerifyCodeDelegate, SignUpVerifyCodeOutcome,
    TokenResponseValidator, ValidatedTokenResponse, VerifyCodeError,
};
pub use signet_transport::{
    ApiRequest, ApiResponse, AuthTransport, Endpoint, HttpTransport, MockTransport, TransportError,
};

/// The most commonly used types, importable in one line.
pub mod prelude {
    pub use crate::client::NativeAuthClient;
    pub use signet_core::{ChallengeType, ClientConfiguration};
    pub use signet_flows::{
        ResetPasswordResendCodeOutcome, ResetPasswordStartOutcome, ResetPasswordSubmitOutcome,
        ResetPasswordVerifyCodeOutcome, RetrieveAccessTokenOutcome, SignInAfterSignUpOutcome,
        SignInParameters, SignInResendCodeOutcome, SignInStartOutcome,
        SignInSubmitPasswordOutcome, SignInVerifyCodeOutcome, SignOutOutcome, SignUpAttributes,
        SignUpAttributesRequiredOutcome, SignUpParameters, SignUpResendCodeOutcome,
        SignUpStartOutcome, SignUpSubmitPasswordOutcome, SignUpVerifyCodeOutcome,
    };
}
