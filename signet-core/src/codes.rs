//! Closed enumerations of server error codes.
//!
//! The token endpoint answers failures with a top-level OAuth error code and,
//! under `invalid_grant`, an ordered list of numeric sub-codes that carry the
//! actual user-facing reason. Both sets are closed: an unknown top-level code
//! fails structured decoding, an unknown numeric code is representable as
//! "unrecognized" via [`ServerSubErrorCode::from_code`] returning `None`.

use serde::{Deserialize, Serialize};

/// Top-level error codes the token endpoint can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenApiError {
    /// The request was malformed.
    InvalidRequest,
    /// The client id is unknown or not allowed.
    InvalidClient,
    /// The grant was rejected; the numeric sub-codes discriminate why.
    InvalidGrant,
    /// The continuation token has expired.
    ExpiredToken,
    /// The refresh token has expired.
    ExpiredRefreshToken,
    /// The server requires a challenge type the client did not advertise.
    UnsupportedChallengeType,
    /// A requested scope is invalid.
    InvalidScope,
    /// The authorization is still pending on the server.
    AuthorizationPending,
    /// The client is polling too fast.
    SlowDown,
}

/// Numeric sub-codes nested under an `invalid_grant` answer.
///
/// The list arrives ordered; the first recognized code wins. The raw values
/// are the service's stable numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerSubErrorCode {
    /// No account exists for the supplied username.
    UserNotFound,
    /// The supplied credentials are wrong.
    InvalidCredentials,
    /// The authentication method is not valid for this account.
    InvalidAuthenticationType,
    /// The one-time code is wrong or was already used.
    InvalidOtp,
    /// The account requires multi-factor authentication.
    StrongAuthRequired,
    /// The password reset continuation token is not valid.
    InvalidPasswordResetToken,
}

impl ServerSubErrorCode {
    /// Map a raw numeric code to a known sub-code.
    ///
    /// Returns `None` for unrecognized codes; callers skip those and keep
    /// scanning the list.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            50034 => Some(Self::UserNotFound),
            50126 => Some(Self::InvalidCredentials),
            400002 => Some(Self::InvalidAuthenticationType),
            50181 => Some(Self::InvalidOtp),
            50079 => Some(Self::StrongAuthRequired),
            90158 => Some(Self::InvalidPasswordResetToken),
            _ => None,
        }
    }

    /// The raw numeric value of this sub-code.
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::UserNotFound => 50034,
            Self::InvalidCredentials => 50126,
            Self::InvalidAuthenticationType => 400002,
            Self::InvalidOtp => 50181,
            Self::StrongAuthRequired => 50079,
            Self::InvalidPasswordResetToken => 90158,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_api_error_wire_names() {
        let decoded: TokenApiError = serde_json::from_str("\"invalid_grant\"").unwrap();
        assert_eq!(decoded, TokenApiError::InvalidGrant);

        let decoded: TokenApiError = serde_json::from_str("\"expired_refresh_token\"").unwrap();
        assert_eq!(decoded, TokenApiError::ExpiredRefreshToken);
    }

    #[test]
    fn test_unknown_top_level_code_fails_decoding() {
        assert!(serde_json::from_str::<TokenApiError>("\"untyped_mystery\"").is_err());
    }

    #[test]
    fn test_sub_code_round_trip() {
        for code in [
            ServerSubErrorCode::UserNotFound,
            ServerSubErrorCode::InvalidCredentials,
            ServerSubErrorCode::InvalidAuthenticationType,
            ServerSubErrorCode::InvalidOtp,
            ServerSubErrorCode::StrongAuthRequired,
            ServerSubErrorCode::InvalidPasswordResetToken,
        ] {
            assert_eq!(ServerSubErrorCode::from_code(code.code()), Some(code));
        }
    }

    #[test]
    fn test_unknown_sub_code_is_none() {
        assert_eq!(ServerSubErrorCode::from_code(0), None);
        assert_eq!(ServerSubErrorCode::from_code(-1), None);
        assert_eq!(ServerSubErrorCode::from_code(99999999), None);
    }
}
