//! Claim extraction from `id_token` payloads.
//!
//! Only the payload segment of the JWT is decoded; signature validation is a
//! token-handling concern outside this crate and is not performed here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while extracting claims from an id token.
#[derive(Debug, Error)]
pub enum IdTokenError {
    /// The token does not have the `header.payload.signature` shape.
    #[error("Id token is not a three-segment JWT")]
    MalformedToken,

    /// The payload segment is not valid base64url.
    #[error("Id token payload is not base64url: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The payload is not a valid JSON claim set.
    #[error("Id token payload is not a JSON claim set: {0}")]
    Claims(#[from] serde_json::Error),
}

/// Claims carried in an id token payload.
///
/// Unknown claims are ignored; every claim the engine reads is optional so a
/// sparse token still decodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Displayable username, normally the sign-in email.
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Stable object id of the account in the tenant.
    #[serde(default)]
    pub oid: Option<String>,
    /// Subject claim; fallback identifier when `oid` is absent.
    #[serde(default)]
    pub sub: Option<String>,
    /// Display name of the account.
    #[serde(default)]
    pub name: Option<String>,
    /// Tenant id the account belongs to.
    #[serde(default)]
    pub tid: Option<String>,
}

impl IdTokenClaims {
    /// Decode the claims from a raw JWT without validating its signature.
    pub fn decode(id_token: &str) -> Result<Self, IdTokenError> {
        let mut segments = id_token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(IdTokenError::MalformedToken);
        };
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The displayable username, when the token carries one.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.preferred_username.as_deref()
    }

    /// The stable unique account identifier: `oid`, falling back to `sub`.
    #[must_use]
    pub fn unique_id(&self) -> Option<&str> {
        self.oid.as_deref().or(self.sub.as_deref())
    }
}
