//! The top-level client.

use std::sync::Arc;

use signet_core::{AccountResult, ClientConfiguration};
use signet_flows::{
    CredentialsController, ResetPasswordController, ResetPasswordStartOutcome,
    RetrieveAccessTokenOutcome, SignInController, SignInParameters, SignInStartOutcome,
    SignOutOutcome, SignUpController, SignUpParameters, SignUpStartOutcome,
};
use signet_transport::{AuthTransport, HttpTransport};

/// The entry point of the engine: one instance per configured client.
///
/// The client wires the four flow controllers over one shared transport and
/// configuration. Start operations are exposed directly; subsequent steps
/// (submit a code, submit a password) live on the controller that handed out
/// the state, reachable through the accessors.
///
/// The client is cheap to share: controllers hold `Arc`s to the transport and
/// configuration, and flow state lives entirely in the state objects handed
/// to the caller.
pub struct NativeAuthClient {
    config: Arc<ClientConfiguration>,
    sign_in: SignInController,
    sign_up: SignUpController,
    reset_password: ResetPasswordController,
    credentials: CredentialsController,
}

impl NativeAuthClient {
    /// Build a client with the production HTTP transport.
    #[must_use]
    pub fn new(config: ClientConfiguration) -> Self {
        let transport = Arc::new(HttpTransport::new(&config));
        Self::with_transport(config, transport)
    }

    /// Build a client over a caller-supplied transport.
    #[must_use]
    pub fn with_transport(config: ClientConfiguration, transport: Arc<dyn AuthTransport>) -> Self {
        let config = Arc::new(config);
        tracing::debug!(client_id = config.client_id(), "Building native-auth client");
        Self {
            sign_in: SignInController::new(transport.clone(), config.clone()),
            sign_up: SignUpController::new(transport.clone(), config.clone()),
            reset_password: ResetPasswordController::new(transport.clone(), config.clone()),
            credentials: CredentialsController::new(transport, config.clone()),
            config,
        }
    }

    /// The configuration the client was built with.
    #[must_use]
    pub fn configuration(&self) -> &ClientConfiguration {
        &self.config
    }

    /// Start a sign-in flow.
    pub async fn sign_in(&self, parameters: SignInParameters) -> SignInStartOutcome {
        self.sign_in.start(parameters).await
    }

    /// Start a sign-up flow.
    pub async fn sign_up(&self, parameters: SignUpParameters) -> SignUpStartOutcome {
        self.sign_up.start(parameters).await
    }

    /// Start a reset-password flow.
    pub async fn reset_password(&self, username: &str) -> ResetPasswordStartOutcome {
        self.reset_password.start(username).await
    }

    /// Retrieve a valid access token for a signed-in account.
    pub async fn retrieve_access_token(
        &self,
        account: &AccountResult,
        force_refresh: bool,
    ) -> RetrieveAccessTokenOutcome {
        self.credentials
            .retrieve_access_token(account, force_refresh)
            .await
    }

    /// Sign an account out.
    pub async fn sign_out(&self, account: &AccountResult) -> SignOutOutcome {
        self.credentials.sign_out(account).await
    }

    /// The sign-in controller, for the steps after [`sign_in`](Self::sign_in).
    #[must_use]
    pub fn sign_in_controller(&self) -> &SignInController {
        &self.sign_in
    }

    /// The sign-up controller, for the steps after [`sign_up`](Self::sign_up).
    #[must_use]
    pub fn sign_up_controller(&self) -> &SignUpController {
        &self.sign_up
    }

    /// The reset-password controller, for the steps after
    /// [`reset_password`](Self::reset_password).
    #[must_use]
    pub fn reset_password_controller(&self) -> &ResetPasswordController {
        &self.reset_password
    }

    /// The credentials controller.
    #[must_use]
    pub fn credentials_controller(&self) -> &CredentialsController {
        &self.credentials
    }
}
