//! Token-handling collaborators of the validator.
//!
//! [`TokenResponseHandler`] turns a raw wire payload into a [`TokenResult`];
//! [`AccountResultFactory`] pairs that result with the account it belongs to.
//! Both are seams: the validator only depends on the traits, so tests can
//! substitute failing collaborators without touching the wire layer.

use chrono::{Duration, Utc};
use signet_core::{
    Account, AccountIdentifier, AccountResult, ClientConfiguration, IdTokenClaims, IdTokenError,
    RequestContext, TokenResponse, TokenResult,
};
use thiserror::Error;

/// Why a token response could not be converted into a [`TokenResult`].
#[derive(Debug, Error)]
pub enum TokenHandlerError {
    /// The response carries no access token.
    #[error("Token response is missing the access token")]
    MissingAccessToken,

    /// The response carries no expiry.
    #[error("Token response is missing expires_in")]
    MissingExpiry,

    /// The id token could not be decoded.
    #[error(transparent)]
    IdToken(#[from] IdTokenError),

    /// The id token identifies a different account than the request was for.
    #[error("Token response identifies an unexpected account")]
    AccountMismatch,
}

/// Converts a raw token response into a [`TokenResult`].
pub trait TokenResponseHandler: Send + Sync {
    /// Validate and convert one token response.
    ///
    /// With `validate_account` set, the account identified by the response's
    /// id token must match `account_identifier`.
    fn handle(
        &self,
        context: &RequestContext,
        account_identifier: &AccountIdentifier,
        token_response: &TokenResponse,
        configuration: &ClientConfiguration,
        validate_account: bool,
    ) -> Result<TokenResult, TokenHandlerError>;
}

/// Builds the caller-facing [`AccountResult`] from a converted token result.
///
/// Returning `None` signals a validation failure; the validator degrades it
/// to its invalid-server-response case.
pub trait AccountResultFactory: Send + Sync {
    /// Build the account result, or `None` when the token result does not
    /// identify an account.
    fn make_account_result(
        &self,
        token_result: &TokenResult,
        context: &RequestContext,
    ) -> Option<AccountResult>;
}

/// The production [`TokenResponseHandler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTokenHandler;

impl StandardTokenHandler {
    /// Create a handler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TokenResponseHandler for StandardTokenHandler {
    fn handle(
        &self,
        _context: &RequestContext,
        account_identifier: &AccountIdentifier,
        token_response: &TokenResponse,
        configuration: &ClientConfiguration,
        validate_account: bool,
    ) -> Result<TokenResult, TokenHandlerError> {
        let access_token = token_response
            .access_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or(TokenHandlerError::MissingAccessToken)?;
        let expires_in = token_response
            .expires_in
            .ok_or(TokenHandlerError::MissingExpiry)?;

        let claims = token_response
            .id_token
            .as_deref()
            .map(IdTokenClaims::decode)
            .transpose()?;

        if validate_account {
            let expected = account_identifier.home_account_id.as_deref();
            let actual = claims.as_ref().and_then(IdTokenClaims::unique_id);
            if let (Some(expected), Some(actual)) = (expected, actual) {
                if expected != actual {
                    return Err(TokenHandlerError::AccountMismatch);
                }
            }
        }

        let scopes: Vec<String> = match token_response.scope.as_deref() {
            Some(scope) if !scope.is_empty() => {
                scope.split_whitespace().map(str::to_string).collect()
            }
            _ => configuration.scopes().to_vec(),
        };

        let now = Utc::now();
        Ok(TokenResult {
            access_token,
            refresh_token: token_response.refresh_token.clone(),
            id_token: token_response.id_token.clone(),
            claims,
            scopes,
            token_type: token_response
                .token_type
                .clone()
                .unwrap_or_else(|| "Bearer".to_string()),
            expires_on: now + Duration::seconds(expires_in as i64),
            extended_expires_on: token_response
                .ext_expires_in
                .map(|ext| now + Duration::seconds(ext as i64)),
        })
    }
}

/// The production [`AccountResultFactory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAccountFactory;

impl StandardAccountFactory {
    /// Create a factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AccountResultFactory for StandardAccountFactory {
    fn make_account_result(
        &self,
        token_result: &TokenResult,
        context: &RequestContext,
    ) -> Option<AccountResult> {
        let claims = token_result.claims.as_ref()?;
        let (Some(username), Some(home_account_id)) = (claims.username(), claims.unique_id())
        else {
            tracing::debug!(
                correlation_id = %context.correlation_id(),
                "Id token claims do not identify an account"
            );
            return None;
        };

        let account = Account {
            username: username.to_string(),
            home_account_id: home_account_id.to_string(),
            id_token_claims: claims.clone(),
        };
        Some(AccountResult::new(account, token_result.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;

    fn config() -> ClientConfiguration {
        ClientConfiguration::new("client-1", "https://contoso.ciamlogin.com/contoso")
            .unwrap()
            .with_scopes(["openid"])
    }

    fn id_token(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.sig")
    }

    fn token_response() -> TokenResponse {
        TokenResponse {
            token_type: Some("Bearer".into()),
            scope: Some("openid profile".into()),
            expires_in: Some(3600),
            ext_expires_in: Some(7200),
            access_token: Some("at-1".into()),
            refresh_token: Some("rt-1".into()),
            id_token: Some(id_token(&serde_json::json!({
                "preferred_username": "user@contoso.com",
                "oid": "oid-1",
            }))),
        }
    }

    #[test]
    fn test_handle_builds_token_result() {
        let result = StandardTokenHandler::new()
            .handle(
                &RequestContext::new(),
                &AccountIdentifier::default(),
                &token_response(),
                &config(),
                true,
            )
            .unwrap();

        assert_eq!(result.access_token, "at-1");
        assert_eq!(result.refresh_token.as_deref(), Some("rt-1"));
        assert_eq!(result.scopes, ["openid", "profile"]);
        assert!(result.extended_expires_on.is_some());
        assert_eq!(
            result.claims.as_ref().and_then(IdTokenClaims::username),
            Some("user@contoso.com")
        );
    }

    #[test]
    fn test_missing_access_token_is_rejected() {
        let mut response = token_response();
        response.access_token = None;
        let error = StandardTokenHandler::new()
            .handle(
                &RequestContext::new(),
                &AccountIdentifier::default(),
                &response,
                &config(),
                true,
            )
            .unwrap_err();
        assert!(matches!(error, TokenHandlerError::MissingAccessToken));
    }

    #[test]
    fn test_account_mismatch_is_rejected() {
        let identifier = AccountIdentifier {
            displayable_id: Some("other@contoso.com".into()),
            home_account_id: Some("oid-other".into()),
        };
        let error = StandardTokenHandler::new()
            .handle(
                &RequestContext::new(),
                &identifier,
                &token_response(),
                &config(),
                true,
            )
            .unwrap_err();
        assert!(matches!(error, TokenHandlerError::AccountMismatch));
    }

    #[test]
    fn test_missing_scope_falls_back_to_configured() {
        let mut response = token_response();
        response.scope = None;
        let result = StandardTokenHandler::new()
            .handle(
                &RequestContext::new(),
                &AccountIdentifier::default(),
                &response,
                &config(),
                false,
            )
            .unwrap();
        assert_eq!(result.scopes, ["openid"]);
    }

    #[test]
    fn test_factory_requires_identifying_claims() {
        let handler = StandardTokenHandler::new();
        let context = RequestContext::new();
        let factory = StandardAccountFactory::new();

        let complete = handler
            .handle(
                &context,
                &AccountIdentifier::default(),
                &token_response(),
                &config(),
                true,
            )
            .unwrap();
        let account = factory.make_account_result(&complete, &context).unwrap();
        assert_eq!(account.username(), "user@contoso.com");
        assert_eq!(account.home_account_id(), "oid-1");

        let mut anonymous = complete.clone();
        anonymous.claims = None;
        assert!(factory.make_account_result(&anonymous, &context).is_none());
    }
}
