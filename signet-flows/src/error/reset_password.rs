//! Error delivered by the reset-password start step.

use std::fmt;

use thiserror::Error;

use super::{messages, ErrorDescriptor};

/// Why starting a reset-password flow failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPasswordStartErrorKind {
    /// The operation must be completed in a browser.
    BrowserRequired,
    /// No account exists for the supplied username.
    UserNotFound,
    /// The account has no password to reset.
    UserDoesNotHavePassword,
    /// The username is syntactically invalid.
    InvalidUsername,
    /// Any other terminal failure.
    GeneralError,
}

/// Error delivered when a reset-password flow cannot be started.
#[derive(Error, Debug, Clone)]
pub struct ResetPasswordStartError {
    kind: ResetPasswordStartErrorKind,
    descriptor: ErrorDescriptor,
}

impl ResetPasswordStartError {
    /// Build an error for the given case.
    #[must_use]
    pub fn new(kind: ResetPasswordStartErrorKind, descriptor: ErrorDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// The error case.
    #[must_use]
    pub fn kind(&self) -> ResetPasswordStartErrorKind {
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
            ResetPasswordStartErrorKind::BrowserRequired => messages::BROWSER_REQUIRED,
            ResetPasswordStartErrorKind::UserNotFound => messages::USER_NOT_FOUND,
            ResetPasswordStartErrorKind::UserDoesNotHavePassword => {
                messages::USER_DOES_NOT_HAVE_PASSWORD
            }
            ResetPasswordStartErrorKind::InvalidUsername => messages::INVALID_USERNAME,
            ResetPasswordStartErrorKind::GeneralError => messages::GENERAL_ERROR,
        })
    }

    /// Returns `true` if a browser is required to continue the operation.
    #[must_use]
    pub fn is_browser_required(&self) -> bool {
        self.kind == ResetPasswordStartErrorKind::BrowserRequired
    }

    /// Returns `true` when no account exists for the username.
    #[must_use]
    pub fn is_user_not_found(&self) -> bool {
        self.kind == ResetPasswordStartErrorKind::UserNotFound
    }

    /// Returns `true` when the username is syntactically invalid.
    #[must_use]
    pub fn is_invalid_username(&self) -> bool {
        self.kind == ResetPasswordStartErrorKind::InvalidUsername
    }
}

impl fmt::Display for ResetPasswordStartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
