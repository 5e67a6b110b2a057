//! Errors delivered by the sign-up start and submit-attributes steps.

use std::fmt;

use thiserror::Error;

use super::{messages, ErrorDescriptor};

/// Why starting a sign-up flow failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpStartErrorKind {
    /// The operation must be completed in a browser.
    BrowserRequired,
    /// An account already exists for the supplied username.
    UserAlreadyExists,
    /// The supplied password violates the tenant policy.
    InvalidPassword,
    /// The username is syntactically invalid.
    InvalidUsername,
    /// One or more supplied attributes failed validation.
    InvalidAttributes,
    /// Any other terminal failure.
    GeneralError,
}

/// Error delivered when a sign-up flow cannot be started.
#[derive(Error, Debug, Clone)]
pub struct SignUpStartError {
    kind: SignUpStartErrorKind,
    descriptor: ErrorDescriptor,
}

impl SignUpStartError {
    /// Build an error for the given case.
    #[must_use]
    pub fn new(kind: SignUpStartErrorKind, descriptor: ErrorDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// The error case.
    #[must_use]
    pub fn kind(&self) -> SignUpStartErrorKind {
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
            SignUpStartErrorKind::BrowserRequired => messages::BROWSER_REQUIRED,
            SignUpStartErrorKind::UserAlreadyExists => messages::USER_ALREADY_EXISTS,
            SignUpStartErrorKind::InvalidPassword => messages::INVALID_PASSWORD,
            SignUpStartErrorKind::InvalidUsername => messages::INVALID_USERNAME,
            SignUpStartErrorKind::InvalidAttributes => messages::INVALID_ATTRIBUTES,
            SignUpStartErrorKind::GeneralError => messages::GENERAL_ERROR,
        })
    }

    /// Returns `true` if a browser is required to continue the operation.
    #[must_use]
    pub fn is_browser_required(&self) -> bool {
        self.kind == SignUpStartErrorKind::BrowserRequired
    }

    /// Returns `true` when an account already exists for the username.
    #[must_use]
    pub fn is_user_already_exists(&self) -> bool {
        self.kind == SignUpStartErrorKind::UserAlreadyExists
    }

    /// Returns `true` when the supplied password violates the policy.
    #[must_use]
    pub fn is_invalid_password(&self) -> bool {
        self.kind == SignUpStartErrorKind::InvalidPassword
    }
}

impl fmt::Display for SignUpStartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Why submitting sign-up attributes failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributesRequiredErrorKind {
    /// The operation must be completed in a browser.
    BrowserRequired,
    /// One or more submitted attributes failed validation; the step can be
    /// retried with the fresh state delivered alongside.
    InvalidAttributes,
    /// Any other terminal failure.
    GeneralError,
}

/// Error delivered when submitted sign-up attributes are rejected.
#[derive(Error, Debug, Clone)]
pub struct AttributesRequiredError {
    kind: AttributesRequiredErrorKind,
    descriptor: ErrorDescriptor,
}

impl AttributesRequiredError {
    /// Build an error for the given case.
    #[must_use]
    pub fn new(kind: AttributesRequiredErrorKind, descriptor: ErrorDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// The error case.
    #[must_use]
    pub fn kind(&self) -> AttributesRequiredErrorKind {
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
            AttributesRequiredErrorKind::BrowserRequired => messages::BROWSER_REQUIRED,
            AttributesRequiredErrorKind::InvalidAttributes => messages::INVALID_ATTRIBUTES,
            AttributesRequiredErrorKind::GeneralError => messages::GENERAL_ERROR,
        })
    }

    /// Returns `true` if a browser is required to continue the operation.
    #[must_use]
    pub fn is_browser_required(&self) -> bool {
        self.kind == AttributesRequiredErrorKind::BrowserRequired
    }

    /// Returns `true` when the submitted attributes failed validation.
    #[must_use]
    pub fn is_invalid_attributes(&self) -> bool {
        self.kind == AttributesRequiredErrorKind::InvalidAttributes
    }
}

impl fmt::Display for AttributesRequiredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
