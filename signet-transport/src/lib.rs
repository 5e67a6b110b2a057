//! # signet-transport
//!
//! The transport seam of the signet native-auth engine.
//!
//! The flow layer never talks HTTP directly; it builds an [`ApiRequest`] and
//! hands it to an [`AuthTransport`]. This crate provides:
//!
//! - [`AuthTransport`]: the narrow async trait the flow layer depends on
//! - [`HttpTransport`]: the production implementation backed by `reqwest`
//! - [`MockTransport`]: an in-process implementation driven by queued
//!   responses, for tests
//!
//! A transport completes every request exactly once: with an [`ApiResponse`]
//! carrying the HTTP status and raw body (success *and* protocol-error
//! answers both arrive this way), or with a [`TransportError`] when no
//! response was obtained at all.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod http;
pub mod mock;
pub mod request;
pub mod transport;

pub use http::HttpTransport;
pub use mock::MockTransport;
pub use request::{ApiRequest, Endpoint};
pub use transport::{ApiResponse, AuthTransport, TransportError};
