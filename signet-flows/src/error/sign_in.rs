//! Errors delivered by the sign-in start step and the post-sign-up sign-in.

use std::fmt;

use thiserror::Error;

use super::{messages, ErrorDescriptor};

/// Why starting a sign-in flow failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStartErrorKind {
    /// The operation must be completed in a browser.
    BrowserRequired,
    /// No account exists for the supplied username.
    UserNotFound,
    /// The supplied credentials are wrong.
    InvalidCredentials,
    /// The username is syntactically invalid.
    InvalidUsername,
    /// Any other terminal failure.
    GeneralError,
}

/// Error delivered when a sign-in flow cannot be started.
#[derive(Error, Debug, Clone)]
pub struct SignInStartError {
    kind: SignInStartErrorKind,
    descriptor: ErrorDescriptor,
}

impl SignInStartError {
    /// Build an error for the given case.
    #[must_use]
    pub fn new(kind: SignInStartErrorKind, descriptor: ErrorDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// The error case.
    #[must_use]
    pub fn kind(&self) -> SignInStartErrorKind {
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
            SignInStartErrorKind::BrowserRequired => messages::BROWSER_REQUIRED,
            SignInStartErrorKind::UserNotFound => messages::USER_NOT_FOUND,
            SignInStartErrorKind::InvalidCredentials => messages::INVALID_CREDENTIALS,
            SignInStartErrorKind::InvalidUsername => messages::INVALID_USERNAME,
            SignInStartErrorKind::GeneralError => messages::GENERAL_ERROR,
        })
    }

    /// Returns `true` if a browser is required to continue the operation.
    #[must_use]
    pub fn is_browser_required(&self) -> bool {
        self.kind == SignInStartErrorKind::BrowserRequired
    }

    /// Returns `true` when no account exists for the username.
    #[must_use]
    pub fn is_user_not_found(&self) -> bool {
        self.kind == SignInStartErrorKind::UserNotFound
    }

    /// Returns `true` when the supplied credentials were rejected.
    #[must_use]
    pub fn is_invalid_credentials(&self) -> bool {
        self.kind == SignInStartErrorKind::InvalidCredentials
    }
}

impl fmt::Display for SignInStartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Why the silent sign-in after a completed sign-up failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInAfterSignUpErrorKind {
    /// The operation must be completed in a browser.
    BrowserRequired,
    /// Any other terminal failure; the caller falls back to a regular
    /// sign-in.
    GeneralError,
}

/// Error delivered when the silent post-sign-up sign-in fails.
#[derive(Error, Debug, Clone)]
pub struct SignInAfterSignUpError {
    kind: SignInAfterSignUpErrorKind,
    descriptor: ErrorDescriptor,
}

impl SignInAfterSignUpError {
    /// Build an error for the given case.
    #[must_use]
    pub fn new(kind: SignInAfterSignUpErrorKind, descriptor: ErrorDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// The error case.
    #[must_use]
    pub fn kind(&self) -> SignInAfterSignUpErrorKind {
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
            SignInAfterSignUpErrorKind::BrowserRequired => messages::BROWSER_REQUIRED,
            SignInAfterSignUpErrorKind::GeneralError => messages::GENERAL_ERROR,
        })
    }

    /// Returns `true` if a browser is required to continue the operation.
    #[must_use]
    pub fn is_browser_required(&self) -> bool {
        self.kind == SignInAfterSignUpErrorKind::BrowserRequired
    }
}

impl fmt::Display for SignInAfterSignUpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
