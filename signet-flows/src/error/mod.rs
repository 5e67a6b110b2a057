//! Public error objects delivered to callers.
//!
//! Each operation has its own closed case enumeration. The shared fields
//! (optional server message, error uri, correlation id) live in
//! [`ErrorDescriptor`], which every error type embeds. Convenience
//! predicates such as `is_browser_required` are computed from the stored
//! case, never stored independently.

use uuid::Uuid;

mod credentials;
mod password_required;
mod reset_password;
mod sign_in;
mod sign_up;
mod verify_code;

pub use credentials::{
    RetrieveAccessTokenError, RetrieveAccessTokenErrorKind, SignOutError, SignOutErrorKind,
};
pub use password_required::{PasswordRequiredError, PasswordRequiredErrorKind};
pub use reset_password::{ResetPasswordStartError, ResetPasswordStartErrorKind};
pub use sign_in::{
    SignInAfterSignUpError, SignInAfterSignUpErrorKind, SignInStartError, SignInStartErrorKind,
};
pub use sign_up::{
    AttributesRequiredError, AttributesRequiredErrorKind, SignUpStartError, SignUpStartErrorKind,
};
pub use verify_code::{
    ResendCodeError, ResendCodeErrorKind, VerifyCodeError, VerifyCodeErrorKind,
};

/// Fixed per-case fallback messages.
pub(crate) mod messages {
    pub const BROWSER_REQUIRED: &str =
        "The operation cannot be completed natively and requires a browser.";
    pub const GENERAL_ERROR: &str = "An unexpected error occurred.";
    pub const UNEXPECTED_RESPONSE: &str = "The server answered with an unexpected response.";
    pub const INVALID_CODE: &str = "The verification code is incorrect or has expired.";
    pub const INVALID_PASSWORD: &str =
        "The password is incorrect or does not satisfy the password policy.";
    pub const INVALID_CREDENTIALS: &str = "The supplied credentials are incorrect.";
    pub const USER_NOT_FOUND: &str = "No account was found for this username.";
    pub const USER_ALREADY_EXISTS: &str = "An account already exists for this username.";
    pub const INVALID_USERNAME: &str = "The username is not valid.";
    pub const USER_DOES_NOT_HAVE_PASSWORD: &str =
        "The account does not have a password configured.";
    pub const REFRESH_TOKEN_EXPIRED: &str =
        "The refresh token has expired; the account must sign in again.";
    pub const TOKEN_NOT_FOUND: &str = "No refresh token is available for the account.";
    pub const INVALID_ATTRIBUTES: &str = "One or more sign-up attributes failed validation.";
    pub const INVALID_STATE: &str =
        "The supplied flow state was already used; restart the flow to obtain a fresh one.";
}

/// Shared structural record embedded by every public error object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDescriptor {
    /// Server-supplied human-readable description, when one arrived.
    pub message: Option<String>,
    /// Link to further documentation for the failure.
    pub error_uri: Option<String>,
    /// Correlation id of the operation that failed.
    pub correlation_id: Option<Uuid>,
}

impl ErrorDescriptor {
    /// An empty descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server-supplied message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the error uri.
    #[must_use]
    pub fn with_error_uri(mut self, uri: impl Into<String>) -> Self {
        self.error_uri = Some(uri.into());
        self
    }

    /// Set the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// The stored message, or the given fallback when none arrived.
    #[must_use]
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message,
            _ => fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_fallback() {
        let empty = ErrorDescriptor::new();
        assert_eq!(empty.message_or("fallback"), "fallback");

        let blank = ErrorDescriptor::new().with_message("");
        assert_eq!(blank.message_or("fallback"), "fallback");

        let described = ErrorDescriptor::new().with_message("server says no");
        assert_eq!(described.message_or("fallback"), "server says no");
    }
}
