//! Errors delivered by the token-retrieval and sign-out operations.

use std::fmt;

use thiserror::Error;

use super::{messages, ErrorDescriptor};

/// Why retrieving an access token failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieveAccessTokenErrorKind {
    /// The operation must be completed in a browser.
    BrowserRequired,
    /// The refresh token has expired; the account must sign in again.
    RefreshTokenExpired,
    /// The account has no refresh token to redeem.
    TokenNotFound,
    /// Any other terminal failure.
    GeneralError,
}

/// Error delivered when an access token cannot be retrieved.
#[derive(Error, Debug, Clone)]
pub struct RetrieveAccessTokenError {
    kind: RetrieveAccessTokenErrorKind,
    descriptor: ErrorDescriptor,
}

impl RetrieveAccessTokenError {
    /// Build an error for the given case.
    #[must_use]
    pub fn new(kind: RetrieveAccessTokenErrorKind, descriptor: ErrorDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// The error case.
    #[must_use]
    pub fn kind(&self) -> RetrieveAccessTokenErrorKind {
        self.kind
    }

    /// The shared descriptor fields.
    #[must_use]
    pub fn descriptor(&self) -> &ErrorDescriptor {
        &self.descriptor
    }

    /// Describes why the error occurred.
    #[must_use]
    pub fn message(&self) -> &str {
        self.descriptor.message_or(match self.kind {
            RetrieveAccessTokenErrorKind::BrowserRequired => messages::BROWSER_REQUIRED,
            RetrieveAccessTokenErrorKind::RefreshTokenExpired => messages::REFRESH_TOKEN_EXPIRED,
            RetrieveAccessTokenErrorKind::TokenNotFound => messages::TOKEN_NOT_FOUND,
            RetrieveAccessTokenErrorKind::GeneralError => messages::GENERAL_ERROR,
        })
    }

    /// Returns `true` if a browser is required to continue the operation.
    #[must_use]
    pub fn is_browser_required(&self) -> bool {
        self.kind == RetrieveAccessTokenErrorKind::BrowserRequired
    }

    /// Returns `true` when the refresh token has expired.
    #[must_use]
    pub fn is_refresh_token_expired(&self) -> bool {
        self.kind == RetrieveAccessTokenErrorKind::RefreshTokenExpired
    }

    /// Returns `true` when the account has no refresh token to redeem.
    #[must_use]
    pub fn is_token_not_found(&self) -> bool {
        self.kind == RetrieveAccessTokenErrorKind::TokenNotFound
    }
}

impl fmt::Display for RetrieveAccessTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Why signing out failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutErrorKind {
    /// Any terminal failure, including credential-store failures.
    GeneralError,
}

/// Error delivered when a sign-out cannot be completed.
#[derive(Error, Debug, Clone)]
pub struct SignOutError {
    kind: SignOutErrorKind,
    descriptor: ErrorDescriptor,
}

impl SignOutError {
    /// Build an error for the given case.
    #[must_use]
    pub fn new(kind: SignOutErrorKind, descriptor: ErrorDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// The error case.
    #[must_use]
    pub fn kind(&self) -> SignOutErrorKind {
        self.kind
    }

    /// The shared descriptor fields.
    #[must_use]
    pub fn descriptor(&self) -> &ErrorDescriptor {
        &self.descriptor
    }

    /// Describes why the error occurred.
    #[must_use]
    pub fn message(&self) -> &str {
        self.descriptor.message_or(match self.kind {
            SignOutErrorKind::GeneralError => messages::GENERAL_ERROR,
        })
    }
}

impl fmt::Display for SignOutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates_follow_the_case() {
        let expired = RetrieveAccessTokenError::new(
            RetrieveAccessTokenErrorKind::RefreshTokenExpired,
            ErrorDescriptor::new(),
        );
        assert!(expired.is_refresh_token_expired());
        assert!(!expired.is_browser_required());
        assert!(!expired.is_token_not_found());
        assert_eq!(expired.message(), messages::REFRESH_TOKEN_EXPIRED);
    }

    #[test]
    fn test_sign_out_message_defaults() {
        let error = SignOutError::new(SignOutErrorKind::GeneralError, ErrorDescriptor::new());
        assert_eq!(error.message(), messages::GENERAL_ERROR);

        let described = SignOutError::new(
            SignOutErrorKind::GeneralError,
            ErrorDescriptor::new().with_message("store unavailable"),
        );
        assert_eq!(described.to_string(), "store unavailable");
    }
}
