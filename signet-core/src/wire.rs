//! Wire-level payloads for the native-auth endpoints.
//!
//! Success and error bodies are decoded with `serde`; optional fields use
//! `#[serde(default)]` so a missing field never aborts decoding. A body that
//! fails to decode into the expected shape is treated as unstructured and
//! degraded by the flow layer, never propagated raw.

use serde::{Deserialize, Serialize};

use crate::codes::TokenApiError;

/// Successful token endpoint payload.
///
/// All fields are optional at the wire level; the token-handling step decides
/// which absences make the response unusable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Token type, normally `Bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Space-separated scopes granted.
    #[serde(default)]
    pub scope: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Extended lifetime in seconds, honored during server outages.
    #[serde(default)]
    pub ext_expires_in: Option<u64>,
    /// The access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// The refresh token, when `offline_access` was granted.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// The raw id token (JWT), carrying the account claims.
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Structured token endpoint error body.
///
/// `error` is a closed enumeration: a body carrying an unknown top-level code
/// does not decode and is handled as unstructured.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    /// Top-level OAuth error code.
    pub error: TokenApiError,
    /// Human-readable description supplied by the server.
    #[serde(default)]
    pub error_description: Option<String>,
    /// Ordered numeric sub-codes; only meaningful under `invalid_grant`.
    #[serde(default)]
    pub error_codes: Vec<i64>,
    /// Link to further documentation for the failure.
    #[serde(default)]
    pub error_uri: Option<String>,
}

/// Answer of the `challenge` endpoints and of `initiate`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeResponse {
    /// Challenge the server selected: `oob`, `password`, or `redirect`.
    #[serde(default)]
    pub challenge_type: Option<String>,
    /// Token to present on the next step of the flow.
    #[serde(default)]
    pub continuation_token: Option<String>,
    /// Masked label of the code target, e.g. `u***@contoso.com`.
    #[serde(default)]
    pub challenge_target_label: Option<String>,
    /// Delivery channel of the code: `email` or `phone`.
    #[serde(default)]
    pub challenge_channel: Option<String>,
    /// Length of the one-time code that was sent.
    #[serde(default)]
    pub code_length: Option<u32>,
    /// Binding method for the code entry, currently always `none`.
    #[serde(default)]
    pub binding_method: Option<String>,
}

impl ChallengeResponse {
    /// Whether the server demanded a browser redirect instead of a native
    /// challenge.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.challenge_type.as_deref() == Some("redirect")
    }
}

/// Answer of the `continue`/`submit` style endpoints: a fresh continuation
/// token for the next step.
#[derive(Debug, Clone, Deserialize)]
pub struct ContinuationResponse {
    /// Token to present on the next step of the flow.
    #[serde(default)]
    pub continuation_token: Option<String>,
    /// Seconds the continuation token stays valid.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Suggested seconds to wait before polling for completion.
    #[serde(default)]
    pub poll_interval: Option<u64>,
}

/// Completion states reported by the reset-password poll endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStatus {
    /// The submit has not been picked up yet.
    NotStarted,
    /// The new password is still being applied.
    InProgress,
    /// The password change completed.
    Succeeded,
    /// The password change failed server-side.
    Failed,
}

/// Answer of the reset-password poll endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PollCompletionResponse {
    /// Current completion status.
    pub status: PollStatus,
}

/// An attribute the server still requires to finish a sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredAttribute {
    /// Attribute name, e.g. `displayName`.
    pub name: String,
    /// Attribute type hint, e.g. `string`.
    #[serde(default, rename = "type")]
    pub attribute_type: Option<String>,
    /// Whether the attribute must be supplied.
    #[serde(default)]
    pub required: bool,
}

/// Error body of the non-token endpoints (start/challenge/continue/submit).
///
/// Unlike the token endpoint these answers use free-form string codes plus a
/// string `suberror`; the helpers below classify the combinations the flow
/// layer cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Top-level error code, e.g. `user_not_found` or `invalid_grant`.
    #[serde(default)]
    pub error: Option<String>,
    /// Refinement of the top-level code, e.g. `password_too_weak`.
    #[serde(default)]
    pub suberror: Option<String>,
    /// Human-readable description supplied by the server.
    #[serde(default)]
    pub error_description: Option<String>,
    /// Ordered numeric sub-codes.
    #[serde(default)]
    pub error_codes: Vec<i64>,
    /// Link to further documentation for the failure.
    #[serde(default)]
    pub error_uri: Option<String>,
    /// Continuation token allowing the caller to retry the failed step.
    #[serde(default)]
    pub continuation_token: Option<String>,
    /// Attributes the server still requires (sign-up only).
    #[serde(default)]
    pub required_attributes: Option<Vec<RequiredAttribute>>,
}

const PASSWORD_SUBERRORS: [&str; 6] = [
    "password_too_weak",
    "password_too_short",
    "password_too_long",
    "password_recently_used",
    "password_banned",
    "password_is_invalid",
];

impl ApiErrorResponse {
    /// The top-level error code, or `""` when absent.
    #[must_use]
    pub fn error_code(&self) -> &str {
        self.error.as_deref().unwrap_or_default()
    }

    /// Whether the server demanded a browser redirect.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.error_code() == "redirect"
            || self.error_code() == "unsupported_challenge_type"
    }

    /// Whether no account exists for the supplied username.
    #[must_use]
    pub fn is_user_not_found(&self) -> bool {
        self.error_code() == "user_not_found"
    }

    /// Whether an account already exists for the supplied username.
    #[must_use]
    pub fn is_user_already_exists(&self) -> bool {
        self.error_code() == "user_already_exists"
    }

    /// Whether the account exists but has no password credential.
    #[must_use]
    pub fn is_user_does_not_have_password(&self) -> bool {
        self.error_code() == "user_does_not_have_password"
            || self.suberror.as_deref() == Some("user_does_not_have_password")
    }

    /// Whether the server requires a password to continue the flow.
    #[must_use]
    pub fn is_credential_required(&self) -> bool {
        self.suberror.as_deref() == Some("credential_required")
    }

    /// Whether the continuation token for the flow has expired.
    #[must_use]
    pub fn is_expired_token(&self) -> bool {
        self.error_code() == "expired_token"
    }

    /// Whether the submitted one-time code was rejected.
    #[must_use]
    pub fn is_invalid_oob(&self) -> bool {
        self.suberror.as_deref() == Some("invalid_oob_value")
    }

    /// Whether the submitted password violates the tenant's password policy.
    #[must_use]
    pub fn is_password_policy_violation(&self) -> bool {
        matches!(self.suberror.as_deref(), Some(s) if PASSWORD_SUBERRORS.contains(&s))
    }

    /// Whether the server requires further sign-up attributes.
    #[must_use]
    pub fn is_attributes_required(&self) -> bool {
        self.suberror.as_deref() == Some("attributes_required")
    }

    /// Whether submitted sign-up attributes failed validation.
    #[must_use]
    pub fn is_attribute_validation_failed(&self) -> bool {
        self.suberror.as_deref() == Some("attribute_validation_failed")
    }
}
