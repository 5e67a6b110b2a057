//! Client configuration.
//!
//! [`ClientConfiguration`] describes the tenant a client talks to: the
//! application (client) id, the authority URL the native-auth endpoints hang
//! off, the challenge types the client is able to handle, and the default
//! scopes requested on token calls.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Challenge types a client can declare support for.
///
/// The server picks a challenge from the advertised set; a server that
/// requires a challenge outside the set answers with `redirect`, which the
/// flow layer surfaces as a browser-required error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeType {
    /// One-time code delivered out of band (email, SMS).
    Oob,
    /// Password challenge.
    Password,
    /// Browser redirect; always advertised so the server can demand it.
    Redirect,
}

impl ChallengeType {
    /// The wire value used in `challenge_type` request fields.
    #[must_use]
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Oob => "oob",
            Self::Password => "password",
            Self::Redirect => "redirect",
        }
    }
}

/// Errors raised while building a [`ClientConfiguration`].
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The authority string is not a valid absolute URL.
    #[error("Invalid authority URL: {0}")]
    InvalidAuthority(#[from] url::ParseError),

    /// The authority must use the https scheme.
    #[error("Authority must use https, got {0}")]
    InsecureAuthority(String),

    /// The client id is empty.
    #[error("Client id must not be empty")]
    EmptyClientId,
}

/// Configuration for a native-auth client.
///
/// # Example
///
/// ```rust
/// use signet_core::{ChallengeType, ClientConfiguration};
///
/// let config = ClientConfiguration::new(
///     "1f98a992-3b0a-4bbd-8ad9-97b0565aa930",
///     "https://contoso.ciamlogin.com/contoso.onmicrosoft.com",
/// )
/// .unwrap()
/// .with_challenge_types([ChallengeType::Oob, ChallengeType::Password])
/// .with_scopes(["openid", "offline_access"]);
///
/// assert_eq!(config.challenge_types_value(), "oob password redirect");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfiguration {
    client_id: String,
    authority: Url,
    challenge_types: Vec<ChallengeType>,
    scopes: Vec<String>,
    request_timeout: Duration,
}

impl ClientConfiguration {
    /// Create a configuration for the given client id and authority URL.
    pub fn new(
        client_id: impl Into<String>,
        authority: impl AsRef<str>,
    ) -> Result<Self, ConfigurationError> {
        let client_id = client_id.into();
        if client_id.is_empty() {
            return Err(ConfigurationError::EmptyClientId);
        }
        let authority = Url::parse(authority.as_ref())?;
        if authority.scheme() != "https" {
            return Err(ConfigurationError::InsecureAuthority(
                authority.scheme().to_string(),
            ));
        }
        Ok(Self {
            client_id,
            authority,
            challenge_types: vec![ChallengeType::Oob, ChallengeType::Password],
            scopes: Vec::new(),
            request_timeout: Duration::from_secs(30),
        })
    }

    /// Replace the advertised challenge types.
    ///
    /// `Redirect` does not need to be listed; it is always advertised on the
    /// wire so the server can escalate to a browser.
    #[must_use]
    pub fn with_challenge_types(
        mut self,
        challenge_types: impl IntoIterator<Item = ChallengeType>,
    ) -> Self {
        self.challenge_types = challenge_types
            .into_iter()
            .filter(|c| *c != ChallengeType::Redirect)
            .collect();
        self
    }

    /// Set the default scopes requested on token calls.
    #[must_use]
    pub fn with_scopes<S: Into<String>>(mut self, scopes: impl IntoIterator<Item = S>) -> Self {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-request timeout applied by the HTTP transport.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The application (client) id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The authority URL the endpoints hang off.
    #[must_use]
    pub fn authority(&self) -> &Url {
        &self.authority
    }

    /// The configured challenge types, without the implicit `redirect`.
    #[must_use]
    pub fn challenge_types(&self) -> &[ChallengeType] {
        &self.challenge_types
    }

    /// The default scopes requested on token calls.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// The space-separated `challenge_type` value sent on the wire.
    ///
    /// `redirect` is always appended last.
    #[must_use]
    pub fn challenge_types_value(&self) -> String {
        let mut parts: Vec<&str> = self.challenge_types.iter().map(ChallengeType::as_wire).collect();
        parts.push(ChallengeType::Redirect.as_wire());
        parts.join(" ")
    }

    /// The space-separated scope value sent on token calls.
    #[must_use]
    pub fn scopes_value(&self) -> String {
        self.scopes.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT_ID: &str = "1f98a992-3b0a-4bbd-8ad9-97b0565aa930";
    const AUTHORITY: &str = "https://contoso.ciamlogin.com/contoso.onmicrosoft.com";

    #[test]
    fn test_builder() {
        let config = ClientConfiguration::new(CLIENT_ID, AUTHORITY)
            .unwrap()
            .with_scopes(["openid"])
            .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.client_id(), CLIENT_ID);
        assert_eq!(config.scopes(), ["openid".to_string()]);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_redirect_is_always_advertised() {
        let config = ClientConfiguration::new(CLIENT_ID, AUTHORITY)
            .unwrap()
            .with_challenge_types([ChallengeType::Oob, ChallengeType::Redirect]);
        assert_eq!(config.challenge_types(), [ChallengeType::Oob]);
        assert_eq!(config.challenge_types_value(), "oob redirect");
    }

    #[test]
    fn test_rejects_plain_http_authority() {
        let err = ClientConfiguration::new(CLIENT_ID, "http://contoso.example").unwrap_err();
        assert!(matches!(err, ConfigurationError::InsecureAuthority(_)));
    }

    #[test]
    fn test_rejects_empty_client_id() {
        let err = ClientConfiguration::new("", AUTHORITY).unwrap_err();
        assert!(matches!(err, ConfigurationError::EmptyClientId));
    }
}
