//! Typed request descriptors.
//!
//! An [`ApiRequest`] names the endpoint it targets and carries the form
//! parameters to post. Request construction stays with the flow layer; the
//! transport only needs the descriptor.

/// The native-auth endpoints, relative to the tenant authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Start a sign-up flow.
    SignUpStart,
    /// Request a sign-up challenge.
    SignUpChallenge,
    /// Continue a sign-up flow (code, password, or attributes).
    SignUpContinue,
    /// Start a sign-in flow.
    SignInInitiate,
    /// Request a sign-in challenge.
    SignInChallenge,
    /// The token endpoint.
    Token,
    /// Start a reset-password flow.
    ResetPasswordStart,
    /// Request a reset-password challenge.
    ResetPasswordChallenge,
    /// Submit the reset-password one-time code.
    ResetPasswordContinue,
    /// Submit the new password.
    ResetPasswordSubmit,
    /// Poll for reset-password completion.
    ResetPasswordPollCompletion,
}

impl Endpoint {
    /// Path of the endpoint relative to the authority.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::SignUpStart => "signup/v1.0/start",
            Self::SignUpChallenge => "signup/v1.0/challenge",
            Self::SignUpContinue => "signup/v1.0/continue",
            Self::SignInInitiate => "oauth2/v2.0/initiate",
            Self::SignInChallenge => "oauth2/v2.0/challenge",
            Self::Token => "oauth2/v2.0/token",
            Self::ResetPasswordStart => "resetpassword/v1.0/start",
            Self::ResetPasswordChallenge => "resetpassword/v1.0/challenge",
            Self::ResetPasswordContinue => "resetpassword/v1.0/continue",
            Self::ResetPasswordSubmit => "resetpassword/v1.0/submit",
            Self::ResetPasswordPollCompletion => "resetpassword/v1.0/poll_completion",
        }
    }
}

/// A form-encoded POST against one endpoint.
///
/// # Example
///
/// ```rust
/// use signet_transport::{ApiRequest, Endpoint};
///
/// let request = ApiRequest::new(Endpoint::SignInInitiate)
///     .form("client_id", "my-client")
///     .form("username", "user@contoso.com");
///
/// assert_eq!(request.endpoint(), Endpoint::SignInInitiate);
/// assert_eq!(request.form_value("username"), Some("user@contoso.com"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    endpoint: Endpoint,
    form: Vec<(String, String)>,
}

impl ApiRequest {
    /// Create an empty request against the given endpoint.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            form: Vec::new(),
        }
    }

    /// Append a form parameter.
    #[must_use]
    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Append a form parameter only when a value is present.
    #[must_use]
    pub fn form_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.form(key, value),
            None => self,
        }
    }

    /// The endpoint this request targets.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// The form parameters, in insertion order.
    #[must_use]
    pub fn form_params(&self) -> &[(String, String)] {
        &self.form
    }

    /// Look up the first value recorded for a form key.
    #[must_use]
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
