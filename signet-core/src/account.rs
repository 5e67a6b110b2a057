//! Account and token data model.
//!
//! These types are the durable output of a successful flow: what the caller
//! keeps hold of after signing in, and what the credentials controller takes
//! back in when refreshing or signing out.

use chrono::{DateTime, Duration, Utc};

use crate::id_token::IdTokenClaims;

/// Identifier pair extracted from the id token before token handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountIdentifier {
    /// Displayable username, normally the sign-in email.
    pub displayable_id: Option<String>,
    /// Stable unique id of the account in its home tenant.
    pub home_account_id: Option<String>,
}

impl AccountIdentifier {
    /// Build an identifier from decoded id-token claims.
    #[must_use]
    pub fn from_claims(claims: &IdTokenClaims) -> Self {
        Self {
            displayable_id: claims.username().map(str::to_string),
            home_account_id: claims.unique_id().map(str::to_string),
        }
    }
}

/// A signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Displayable username.
    pub username: String,
    /// Stable unique id of the account in its home tenant.
    pub home_account_id: String,
    /// Claims carried by the id token the account was built from.
    pub id_token_claims: IdTokenClaims,
}

/// Tokens produced by a validated token response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResult {
    /// The access token.
    pub access_token: String,
    /// The refresh token, when one was granted.
    pub refresh_token: Option<String>,
    /// The raw id token the claims were extracted from.
    pub id_token: Option<String>,
    /// Claims decoded from the id token.
    pub claims: Option<IdTokenClaims>,
    /// Scopes the access token is valid for.
    pub scopes: Vec<String>,
    /// Token type, normally `Bearer`.
    pub token_type: String,
    /// When the access token expires.
    pub expires_on: DateTime<Utc>,
    /// Extended expiry honored during server outages, when granted.
    pub extended_expires_on: Option<DateTime<Utc>>,
}

/// Leeway subtracted from the expiry when deciding whether a cached access
/// token is still usable.
const EXPIRY_SKEW_SECONDS: i64 = 300;

impl TokenResult {
    /// Whether the access token should be treated as expired.
    ///
    /// Applies a five-minute skew so a token about to lapse mid-request is
    /// refreshed instead of served.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_SKEW_SECONDS) >= self.expires_on
    }
}

/// Result handed to the caller after a completed sign-in: the account plus
/// the tokens backing it.
///
/// The result is immutable; refreshing produces a replacement via
/// [`AccountResult::with_token_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountResult {
    /// The signed-in account.
    pub account: Account,
    token_result: TokenResult,
}

impl AccountResult {
    /// Pair an account with the tokens backing it.
    #[must_use]
    pub fn new(account: Account, token_result: TokenResult) -> Self {
        Self {
            account,
            token_result,
        }
    }

    /// The displayable username of the account.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.account.username
    }

    /// The stable unique id of the account.
    #[must_use]
    pub fn home_account_id(&self) -> &str {
        &self.account.home_account_id
    }

    /// The tokens currently backing the account.
    #[must_use]
    pub fn token_result(&self) -> &TokenResult {
        &self.token_result
    }

    /// The refresh token, when one was granted.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.token_result.refresh_token.as_deref()
    }

    /// Replace the tokens, producing the refreshed result that supersedes
    /// this one.
    #[must_use]
    pub fn with_token_result(&self, token_result: TokenResult) -> Self {
        Self {
            account: self.account.clone(),
            token_result,
        }
    }
}
