//! Error delivered by the submit-password steps.

use std::fmt;

use thiserror::Error;

use super::{messages, ErrorDescriptor};

/// Why submitting a password failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRequiredErrorKind {
    /// The operation must be completed in a browser.
    BrowserRequired,
    /// The password is wrong or violates the tenant policy; the step can be
    /// retried with the fresh state delivered alongside.
    InvalidPassword,
    /// Any other terminal failure.
    GeneralError,
}

/// Error delivered when a submitted password is rejected.
#[derive(Error, Debug, Clone)]
pub struct PasswordRequiredError {
    kind: PasswordRequiredErrorKind,
    descriptor: ErrorDescriptor,
}

impl PasswordRequiredError {
    /// Build an error for the given case.
    #[must_use]
    pub fn new(kind: PasswordRequiredErrorKind, descriptor: ErrorDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// The error case.
    #[must_use]
    pub fn kind(&self) -> PasswordRequiredErrorKind {
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
            PasswordRequiredErrorKind::BrowserRequired => messages::BROWSER_REQUIRED,
            PasswordRequiredErrorKind::InvalidPassword => messages::INVALID_PASSWORD,
            PasswordRequiredErrorKind::GeneralError => messages::GENERAL_ERROR,
        })
    }

    /// Returns `true` if a browser is required to continue the operation.
    #[must_use]
    pub fn is_browser_required(&self) -> bool {
        self.kind == PasswordRequiredErrorKind::BrowserRequired
    }

    /// Returns `true` when the submitted password was rejected.
    #[must_use]
    pub fn is_invalid_password(&self) -> bool {
        self.kind == PasswordRequiredErrorKind::InvalidPassword
    }
}

impl fmt::Display for PasswordRequiredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
