//! # signet-flows
//!
//! The flow state-machine layer of the signet native-auth engine.
//!
//! Each logical operation (sign-in, sign-up, reset password, token refresh,
//! sign-out) is driven by a controller whose steps take the current flow
//! state plus user input and produce exactly one typed outcome: a terminal
//! success, a terminal error, or a new state the caller must act on.
//!
//! - **Validator**: [`TokenResponseValidator`] converts a raw token-endpoint
//!   result into a [`ValidatedTokenResponse`] with a closed error taxonomy
//! - **States**: immutable, single-use snapshots of flow progress
//! - **Controllers**: [`SignInController`], [`SignUpController`],
//!   [`ResetPasswordController`], [`CredentialsController`]
//! - **Delegates**: per-step callback traits; every outcome can be matched
//!   directly or dispatched to a delegate, which invokes exactly one method
//! - **Errors**: per-operation closed case enums with derived predicates
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use signet_core::ClientConfiguration;
//! use signet_flows::{ResetPasswordController, ResetPasswordStartOutcome};
//! use signet_flows::store::InMemoryCredentialStore;
//! use signet_transport::HttpTransport;
//!
//! # async fn run() {
//! let config = Arc::new(
//!     ClientConfiguration::new("client-id", "https://contoso.ciamlogin.com/contoso").unwrap(),
//! );
//! let transport = Arc::new(HttpTransport::new(&config));
//! let controller = ResetPasswordController::new(transport, config);
//!
//! match controller.start("user@contoso.com").await {
//!     ResetPasswordStartOutcome::CodeSent { state, sent_to, .. } => {
//!         println!("code sent to {sent_to}");
//!         let _ = controller.submit_code("123456", &state).await;
//!     }
//!     ResetPasswordStartOutcome::Error(error) => eprintln!("{error}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

mod api;
mod challenge;
pub mod credentials;
pub mod error;
pub mod reset_password;
pub mod sign_in;
pub mod sign_up;
pub mod state;
pub mod store;
pub mod token;
pub mod token_handler;
pub mod validator;

pub use credentials::{
    AccessToken, CredentialsController, RetrieveAccessTokenDelegate, RetrieveAccessTokenOutcome,
    SignOutDelegate, SignOutOutcome,
};
pub use error::{
    AttributesRequiredError, ErrorDescriptor, PasswordRequiredError, ResendCodeError,
    ResetPasswordStartError, RetrieveAccessTokenError, SignInAfterSignUpError, SignInStartError,
    SignOutError, SignUpStartError, VerifyCodeError,
};
pub use reset_password::{
    ResetPasswordController, ResetPasswordResendCodeDelegate, ResetPasswordResendCodeOutcome,
    ResetPasswordRequiredDelegate, ResetPasswordStartDelegate, ResetPasswordStartOutcome,
    ResetPasswordSubmitOutcome, ResetPasswordVerifyCodeDelegate, ResetPasswordVerifyCodeOutcome,
};
pub use sign_in::{
    SignInAfterSignUpDelegate, SignInAfterSignUpOutcome, SignInController, SignInParameters,
    SignInPasswordRequiredDelegate, SignInResendCodeDelegate, SignInResendCodeOutcome,
    SignInStartDelegate, SignInStartOutcome, SignInSubmitPasswordOutcome,
    SignInVerifyCodeDelegate, SignInVerifyCodeOutcome,
};
pub use sign_up::{
    SignUpAttributes, SignUpAttributesRequiredDelegate, SignUpAttributesRequiredOutcome,
    SignUpController, SignUpParameters, SignUpPasswordRequiredDelegate, SignUpResendCodeDelegate,
    SignUpResendCodeOutcome, SignUpStartDelegate, SignUpStartOutcome, SignUpSubmitPasswordOutcome,
    SignUpVerifyCodeDelegate, SignUpVerifyCodeOutcome,
};
pub use state::{
    ChallengeChannel, ResetPasswordCodeSentState, ResetPasswordRequiredState,
    SignInAfterSignUpState, SignInCodeSentState, SignInPasswordRequiredState,
    SignUpAttributesRequiredState, SignUpCodeSentState, SignUpPasswordRequiredState,
};
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError};
pub use token::TokenRequestError;
pub use token_handler::{
    AccountResultFactory, StandardAccountFactory, StandardTokenHandler, TokenHandlerError,
    TokenResponseHandler,
};
pub use validator::{
    TokenResponseValidator, TokenValidationError, TokenValidationErrorKind, ValidatedTokenResponse,
};
