//! Access-token retrieval and sign-out.
//!
//! [`CredentialsController::retrieve_access_token`] serves the cached access
//! token while it is still valid and redeems the refresh token otherwise.
//! [`CredentialsController::sign_out`] clears the account from the credential
//! store. Neither operation uses flow states; both take the caller's
//! [`AccountResult`] directly.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signet_core::{AccountResult, ClientConfiguration, RequestContext};
use signet_transport::AuthTransport;

use crate::error::{
    ErrorDescriptor, RetrieveAccessTokenError, RetrieveAccessTokenErrorKind, SignOutError,
    SignOutErrorKind,
};
use crate::store::{CredentialStore, InMemoryCredentialStore};
use crate::token;
use crate::validator::{TokenResponseValidator, TokenValidationErrorKind, ValidatedTokenResponse};

/// An access token served to the caller, with the scopes and expiry it is
/// valid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The token itself.
    pub token: String,
    /// Scopes the token is valid for.
    pub scopes: Vec<String>,
    /// When the token expires.
    pub expires_on: DateTime<Utc>,
}

/// Outcome of [`CredentialsController::retrieve_access_token`].
#[derive(Debug)]
pub enum RetrieveAccessTokenOutcome {
    /// A valid access token is available.
    Completed {
        /// The access token to use.
        access_token: AccessToken,
        /// The account result backing the token; replaces the one passed in
        /// when a refresh happened.
        account: AccountResult,
    },
    /// No valid access token could be obtained.
    Error(RetrieveAccessTokenError),
}

impl RetrieveAccessTokenOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn RetrieveAccessTokenDelegate) {
        match self {
            Self::Completed {
                access_token,
                account,
            } => delegate.on_access_token_retrieved(access_token, account).await,
            Self::Error(error) => delegate.on_access_token_retrieval_error(error).await,
        }
    }
}

/// Callback contract for [`CredentialsController::retrieve_access_token`].
#[async_trait]
pub trait RetrieveAccessTokenDelegate: Send + Sync {
    /// A valid access token is available.
    async fn on_access_token_retrieved(&self, access_token: AccessToken, account: AccountResult);

    /// No valid access token could be obtained.
    async fn on_access_token_retrieval_error(&self, error: RetrieveAccessTokenError);
}

/// Outcome of [`CredentialsController::sign_out`].
#[derive(Debug)]
pub enum SignOutOutcome {
    /// The account was signed out.
    Completed,
    /// The sign-out failed.
    Error(SignOutError),
}

impl SignOutOutcome {
    /// Deliver this outcome through a delegate, invoking exactly one method.
    pub async fn dispatch(self, delegate: &dyn SignOutDelegate) {
        match self {
            Self::Completed => delegate.on_sign_out_completed().await,
            Self::Error(error) => delegate.on_sign_out_error(error).await,
        }
    }
}

/// Callback contract for [`CredentialsController::sign_out`].
#[async_trait]
pub trait SignOutDelegate: Send + Sync {
    /// The account was signed out.
    async fn on_sign_out_completed(&self);

    /// The sign-out failed.
    async fn on_sign_out_error(&self, error: SignOutError);
}

/// Serves access tokens for signed-in accounts and signs them out.
pub struct CredentialsController {
    transport: Arc<dyn AuthTransport>,
    config: Arc<ClientConfiguration>,
    store: Arc<dyn CredentialStore>,
    validator: TokenResponseValidator,
}

impl CredentialsController {
    /// Build a controller with a process-local credential store.
    #[must_use]
    pub fn new(transport: Arc<dyn AuthTransport>, config: Arc<ClientConfiguration>) -> Self {
        Self {
            transport,
            config,
            store: Arc::new(InMemoryCredentialStore::new()),
            validator: TokenResponseValidator::standard(),
        }
    }

    /// Replace the credential store, e.g. with a platform-backed one.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = store;
        self
    }

    /// Retrieve a valid access token for the account.
    ///
    /// The cached token is served while it is still valid and `force_refresh`
    /// is not set; otherwise the refresh token is redeemed and the refreshed
    /// account result is delivered next to the token.
    pub async fn retrieve_access_token(
        &self,
        account: &AccountResult,
        force_refresh: bool,
    ) -> RetrieveAccessTokenOutcome {
        let context = RequestContext::new();

        if !force_refresh && !account.token_result().is_expired() {
            let token_result = account.token_result();
            return RetrieveAccessTokenOutcome::Completed {
                access_token: AccessToken {
                    token: token_result.access_token.clone(),
                    scopes: token_result.scopes.clone(),
                    expires_on: token_result.expires_on,
                },
                account: account.clone(),
            };
        }

        let Some(refresh_token) = account.refresh_token() else {
            return RetrieveAccessTokenOutcome::Error(RetrieveAccessTokenError::new(
                RetrieveAccessTokenErrorKind::TokenNotFound,
                ErrorDescriptor::new().with_correlation_id(context.correlation_id()),
            ));
        };

        tracing::debug!(
            correlation_id = %context.correlation_id(),
            force_refresh,
            "Redeeming refresh token"
        );

        let request = token::refresh_grant(&self.config, refresh_token, &[]);
        let result = token::request_token(self.transport.as_ref(), request, &context).await;
        match self.validator.validate(&context, &self.config, result) {
            ValidatedTokenResponse::Success { token_result, .. } => {
                let refreshed = account.with_token_result(token_result);
                if let Err(error) = self.store.save(&refreshed) {
                    tracing::warn!(
                        correlation_id = %context.correlation_id(),
                        %error,
                        "Refreshed account could not be saved"
                    );
                }
                let token_result = refreshed.token_result();
                RetrieveAccessTokenOutcome::Completed {
                    access_token: AccessToken {
                        token: token_result.access_token.clone(),
                        scopes: token_result.scopes.clone(),
                        expires_on: token_result.expires_on,
                    },
                    account: refreshed,
                }
            }
            ValidatedTokenResponse::Error(error) => {
                let kind = match error.kind() {
                    TokenValidationErrorKind::ExpiredRefreshToken => {
                        RetrieveAccessTokenErrorKind::RefreshTokenExpired
                    }
                    TokenValidationErrorKind::StrongAuthRequired
                    | TokenValidationErrorKind::UnsupportedChallengeType => {
                        RetrieveAccessTokenErrorKind::BrowserRequired
                    }
                    _ => RetrieveAccessTokenErrorKind::GeneralError,
                };
                RetrieveAccessTokenOutcome::Error(RetrieveAccessTokenError::new(
                    kind,
                    error.into_descriptor(),
                ))
            }
        }
    }

    /// Sign the account out, clearing it from the credential store.
    pub async fn sign_out(&self, account: &AccountResult) -> SignOutOutcome {
        let context = RequestContext::new();
        tracing::debug!(
            correlation_id = %context.correlation_id(),
            "Signing out"
        );

        match self.store.clear(account.home_account_id()) {
            Ok(()) => SignOutOutcome::Completed,
            Err(error) => SignOutOutcome::Error(SignOutError::new(
                SignOutErrorKind::GeneralError,
                ErrorDescriptor::new()
                    .with_correlation_id(context.correlation_id())
                    .with_message(error.to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use chrono::Duration;
    use signet_core::{Account, IdTokenClaims, TokenResult};
    use signet_transport::{Endpoint, MockTransport};

    fn controller(transport: MockTransport) -> CredentialsController {
        let config = ClientConfiguration::new("client-1", "https://contoso.ciamlogin.com/contoso")
            .unwrap()
            .with_scopes(["openid"]);
        CredentialsController::new(Arc::new(transport), Arc::new(config))
    }

    fn account(expires_on: DateTime<Utc>, refresh_token: Option<&str>) -> AccountResult {
        AccountResult::new(
            Account {
                username: "user@contoso.com".into(),
                home_account_id: "oid-1".into(),
                id_token_claims: IdTokenClaims::default(),
            },
            TokenResult {
                access_token: "at-cached".into(),
                refresh_token: refresh_token.map(str::to_string),
                id_token: None,
                claims: None,
                scopes: vec!["openid".into()],
                token_type: "Bearer".into(),
                expires_on,
                extended_expires_on: None,
            },
        )
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
            "access_token": "at-fresh",
            "refresh_token": "rt-2",
            "id_token": format!("{header}.{payload}.sig"),
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_valid_cached_token_is_served_without_network() {
        let transport = MockTransport::new();
        let controller = controller(transport.clone());
        let account = account(Utc::now() + Duration::hours(1), Some("rt-1"));

        match controller.retrieve_access_token(&account, false).await {
            RetrieveAccessTokenOutcome::Completed { access_token, .. } => {
                assert_eq!(access_token.token, "at-cached");
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert!(transport.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let transport = MockTransport::new().with_json(200, token_body());
        let observer = transport.clone();
        let controller = controller(transport);
        let account = account(Utc::now() - Duration::hours(1), Some("rt-1"));

        match controller.retrieve_access_token(&account, false).await {
            RetrieveAccessTokenOutcome::Completed {
                access_token,
                account: refreshed,
            } => {
                assert_eq!(access_token.token, "at-fresh");
                assert_eq!(refreshed.refresh_token(), Some("rt-2"));
                assert_eq!(refreshed.username(), "user@contoso.com");
            }
            other => panic!("expected completion, got {other:?}"),
        }

        let recorded = observer.recorded_requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].endpoint(), Endpoint::Token);
        assert_eq!(recorded[0].form_value("grant_type"), Some("refresh_token"));
        assert_eq!(recorded[0].form_value("refresh_token"), Some("rt-1"));
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_the_cache() {
        let transport = MockTransport::new().with_json(200, token_body());
        let observer = transport.clone();
        let controller = controller(transport);
        let account = account(Utc::now() + Duration::hours(1), Some("rt-1"));

        match controller.retrieve_access_token(&account, true).await {
            RetrieveAccessTokenOutcome::Completed { access_token, .. } => {
                assert_eq!(access_token.token, "at-fresh");
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(observer.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_is_token_not_found() {
        let controller = controller(MockTransport::new());
        let account = account(Utc::now() - Duration::hours(1), None);

        match controller.retrieve_access_token(&account, false).await {
            RetrieveAccessTokenOutcome::Error(error) => assert!(error.is_token_not_found()),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_refresh_token_maps_to_its_own_case() {
        let transport = MockTransport::new().with_json(
            400,
            r#"{"error":"expired_refresh_token","error_description":"Refresh token expired."}"#,
        );
        let controller = controller(transport);
        let account = account(Utc::now() - Duration::hours(1), Some("rt-1"));

        match controller.retrieve_access_token(&account, false).await {
            RetrieveAccessTokenOutcome::Error(error) => {
                assert!(error.is_refresh_token_expired());
                assert_eq!(error.message(), "Refresh token expired.");
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sign_out_clears_the_store() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let controller = controller(MockTransport::new()).with_store(store.clone());
        let account = account(Utc::now() + Duration::hours(1), Some("rt-1"));

        store.save(&account).unwrap();
        match controller.sign_out(&account).await {
            SignOutOutcome::Completed => {}
            SignOutOutcome::Error(error) => panic!("sign out failed: {error}"),
        }
        assert!(store.load("oid-1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_saves_into_the_store() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let controller =
            controller(MockTransport::new().with_json(200, token_body())).with_store(store.clone());
        let account = account(Utc::now() - Duration::hours(1), Some("rt-1"));

        let _ = controller.retrieve_access_token(&account, false).await;
        let saved = store.load("oid-1").unwrap().expect("refresh must persist");
        assert_eq!(saved.token_result().access_token, "at-fresh");
    }
}
