//! # signet-core
//!
//! Core types for the signet native-auth client engine.
//!
//! This crate provides the foundational types used throughout the signet
//! workspace:
//!
//! - **Context**: per-request correlation context
//! - **Configuration**: client configuration for a native-auth tenant
//! - **Wire**: request/response payloads for the native-auth endpoints
//! - **Codes**: closed enumerations of server error codes and sub-codes
//! - **Id tokens**: claim extraction from the `id_token` payload
//! - **Accounts**: the account/token data model produced by a signed-in flow
//!
//! ## Example
//!
//! ```rust
//! use signet_core::{ClientConfiguration, RequestContext};
//!
//! let config = ClientConfiguration::new(
//!     "1f98a992-3b0a-4bbd-8ad9-97b0565aa930",
//!     "https://contoso.ciamlogin.com/contoso.onmicrosoft.com",
//! )
//! .expect("valid authority")
//! .with_scopes(["openid", "offline_access"]);
//!
//! let context = RequestContext::new();
//! assert_eq!(config.client_id(), "1f98a992-3b0a-4bbd-8ad9-97b0565aa930");
//! assert!(!context.correlation_id().is_nil());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod account;
pub mod codes;
pub mod config;
pub mod context;
pub mod id_token;
pub mod wire;

pub use account::{Account, AccountIdentifier, AccountResult, TokenResult};
pub use codes::{ServerSubErrorCode, TokenApiError};
pub use config::{ChallengeType, ClientConfiguration, ConfigurationError};
pub use context::RequestContext;
pub use id_token::{IdTokenClaims, IdTokenError};
pub use wire::{
    ApiErrorResponse, ChallengeResponse, ContinuationResponse, PollCompletionResponse, PollStatus,
    RequiredAttribute, TokenErrorResponse, TokenResponse,
};
