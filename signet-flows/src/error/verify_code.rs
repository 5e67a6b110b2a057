//! Errors delivered by the code-verification and code-resend steps.

use std::fmt;

use thiserror::Error;

use super::{messages, ErrorDescriptor};

/// Why submitting a one-time code failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyCodeErrorKind {
    /// The operation must be completed in a browser.
    BrowserRequired,
    /// The submitted code is wrong or has expired; the step can be retried
    /// with the fresh state delivered alongside.
    InvalidCode,
    /// Any other terminal failure.
    GeneralError,
}

/// Error delivered when a submitted one-time code is rejected.
#[derive(Error, Debug, Clone)]
pub struct VerifyCodeError {
    kind: VerifyCodeErrorKind,
    descriptor: ErrorDescriptor,
}

impl VerifyCodeError {
    /// Build an error for the given case.
    #[must_use]
    pub fn new(kind: VerifyCodeErrorKind, descriptor: ErrorDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// The error case.
    #[must_use]
    pub fn kind(&self) -> VerifyCodeErrorKind {
        self.kind
    }

    /// The shared descriptor fields.
    #[must_use]
    pub fn descriptor(&self) -> &ErrorDescriptor {
        &self.descriptor
    }

    /// Describes why the error occurred; server-supplied when available,
    /// otherwise a fixed per-case default.
    #[must_use]
    pub fn message(&self) -> &str {
        self.descriptor.message_or(match self.kind {
            VerifyCodeErrorKind::BrowserRequired => messages::BROWSER_REQUIRED,
            VerifyCodeErrorKind::InvalidCode => messages::INVALID_CODE,
            VerifyCodeErrorKind::GeneralError => messages::GENERAL_ERROR,
        })
    }

    /// Returns `true` if a browser is required to continue the operation.
    #[must_use]
    pub fn is_browser_required(&self) -> bool {
        self.kind == VerifyCodeErrorKind::BrowserRequired
    }

    /// Returns `true` when the submitted code was not valid.
    #[must_use]
    pub fn is_invalid_code(&self) -> bool {
        self.kind == VerifyCodeErrorKind::InvalidCode
    }
}

impl fmt::Display for VerifyCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Why requesting a new one-time code failed. Resend failures are terminal:
/// no retry state accompanies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendCodeErrorKind {
    /// The operation must be completed in a browser.
    BrowserRequired,
    /// Any other terminal failure.
    GeneralError,
}

/// Error delivered when requesting a new one-time code fails.
#[derive(Error, Debug, Clone)]
pub struct ResendCodeError {
    kind: ResendCodeErrorKind,
    descriptor: ErrorDescriptor,
}

impl ResendCodeError {
    /// Build an error for the given case.
    #[must_use]
    pub fn new(kind: ResendCodeErrorKind, descriptor: ErrorDescriptor) -> Self {
        Self { kind, descriptor }
    }

    /// The error case.
    #[must_use]
    pub fn kind(&self) -> ResendCodeErrorKind {
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
            ResendCodeErrorKind::BrowserRequired => messages::BROWSER_REQUIRED,
            ResendCodeErrorKind::GeneralError => messages::GENERAL_ERROR,
        })
    }

    /// Returns `true` if a browser is required to continue the operation.
    #[must_use]
    pub fn is_browser_required(&self) -> bool {
        self.kind == ResendCodeErrorKind::BrowserRequired
    }
}

impl fmt::Display for ResendCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
