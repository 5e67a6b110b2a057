//! Immutable flow states.
//!
//! A flow state is a snapshot of "where a multi-step flow currently is". It is
//! created only as the output of a successful intermediate step and carries
//! everything the next step needs: the server continuation token, the
//! correlation id of the operation, and the username the flow was started for.
//!
//! States are single-use. Each one carries a one-shot consumption flag shared
//! by all of its clones; the controller flips it when the state is passed back
//! in, and a second use of the same state is rejected with the operation's
//! invalid-state error instead of silently reusing stale context.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signet_core::wire::RequiredAttribute;
use uuid::Uuid;

/// Delivery channel of a one-time code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeChannel {
    /// The code was sent by email.
    Email,
    /// The code was sent by SMS or voice call.
    Phone,
    /// The server reported a channel this client does not know.
    Unknown,
}

impl ChallengeChannel {
    /// Classify the wire-level `challenge_channel` value.
    #[must_use]
    pub fn from_wire(channel: Option<&str>) -> Self {
        match channel {
            Some("email") => Self::Email,
            Some("phone") => Self::Phone,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ChallengeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Phone => write!(f, "phone"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Shared innards of every flow state.
#[derive(Debug)]
struct StateCore {
    continuation_token: String,
    username: String,
    correlation_id: Uuid,
    consumed: AtomicBool,
}

impl StateCore {
    fn new(
        continuation_token: impl Into<String>,
        username: impl Into<String>,
        correlation_id: Uuid,
    ) -> Arc<Self> {
        Arc::new(Self {
            continuation_token: continuation_token.into(),
            username: username.into(),
            correlation_id,
            consumed: AtomicBool::new(false),
        })
    }

    /// Flip the consumption flag. Returns `true` on the first use only; clones
    /// of a state share the flag, so consuming any clone consumes them all.
    fn consume(&self) -> bool {
        !self.consumed.swap(true, Ordering::AcqRel)
    }
}

macro_rules! impl_state_accessors {
    ($state:ty) => {
        impl $state {
            /// The username the flow was started for.
            #[must_use]
            pub fn username(&self) -> &str {
                &self.core.username
            }

            /// The correlation id of the operation this state belongs to.
            #[must_use]
            pub fn correlation_id(&self) -> Uuid {
                self.core.correlation_id
            }

            pub(crate) fn continuation_token(&self) -> &str {
                &self.core.continuation_token
            }

            pub(crate) fn consume(&self) -> bool {
                self.core.consume()
            }
        }
    };
}

/// Reset-password flow: a one-time code was sent and must be submitted next.
#[derive(Debug, Clone)]
pub struct ResetPasswordCodeSentState {
    core: Arc<StateCore>,
    sent_to: String,
    channel: ChallengeChannel,
    code_length: u32,
}

impl ResetPasswordCodeSentState {
    pub(crate) fn new(
        continuation_token: impl Into<String>,
        username: impl Into<String>,
        correlation_id: Uuid,
        sent_to: impl Into<String>,
        channel: ChallengeChannel,
        code_length: u32,
    ) -> Self {
        Self {
            core: StateCore::new(continuation_token, username, correlation_id),
            sent_to: sent_to.into(),
            channel,
            code_length,
        }
    }

    /// Masked label of the code target, e.g. `u***@contoso.com`.
    #[must_use]
    pub fn sent_to(&self) -> &str {
        &self.sent_to
    }

    /// Delivery channel of the code.
    #[must_use]
    pub fn channel(&self) -> ChallengeChannel {
        self.channel
    }

    /// Length of the code that was sent.
    #[must_use]
    pub fn code_length(&self) -> u32 {
        self.code_length
    }
}

impl_state_accessors!(ResetPasswordCodeSentState);

/// Reset-password flow: the code was accepted and a new password is required.
#[derive(Debug, Clone)]
pub struct ResetPasswordRequiredState {
    core: Arc<StateCore>,
}

impl ResetPasswordRequiredState {
    pub(crate) fn new(
        continuation_token: impl Into<String>,
        username: impl Into<String>,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            core: StateCore::new(continuation_token, username, correlation_id),
        }
    }
}

impl_state_accessors!(ResetPasswordRequiredState);

/// Sign-in flow: a one-time code was sent and must be submitted next.
#[derive(Debug, Clone)]
pub struct SignInCodeSentState {
    core: Arc<StateCore>,
    sent_to: String,
    channel: ChallengeChannel,
    code_length: u32,
    scopes: Vec<String>,
}

impl SignInCodeSentState {
    pub(crate) fn new(
        continuation_token: impl Into<String>,
        username: impl Into<String>,
        correlation_id: Uuid,
        sent_to: impl Into<String>,
        channel: ChallengeChannel,
        code_length: u32,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            core: StateCore::new(continuation_token, username, correlation_id),
            sent_to: sent_to.into(),
            channel,
            code_length,
            scopes,
        }
    }

    /// Masked label of the code target.
    #[must_use]
    pub fn sent_to(&self) -> &str {
        &self.sent_to
    }

    /// Delivery channel of the code.
    #[must_use]
    pub fn channel(&self) -> ChallengeChannel {
        self.channel
    }

    /// Length of the code that was sent.
    #[must_use]
    pub fn code_length(&self) -> u32 {
        self.code_length
    }

    pub(crate) fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

impl_state_accessors!(SignInCodeSentState);

/// Sign-in flow: the server selected the password challenge.
#[derive(Debug, Clone)]
pub struct SignInPasswordRequiredState {
    core: Arc<StateCore>,
    scopes: Vec<String>,
}

impl SignInPasswordRequiredState {
    pub(crate) fn new(
        continuation_token: impl Into<String>,
        username: impl Into<String>,
        correlation_id: Uuid,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            core: StateCore::new(continuation_token, username, correlation_id),
            scopes,
        }
    }

    pub(crate) fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

impl_state_accessors!(SignInPasswordRequiredState);

/// Handed out by a completed sign-up: redeems the sign-up continuation token
/// for tokens without asking the user to authenticate again.
#[derive(Debug, Clone)]
pub struct SignInAfterSignUpState {
    core: Arc<StateCore>,
}

impl SignInAfterSignUpState {
    pub(crate) fn new(
        continuation_token: impl Into<String>,
        username: impl Into<String>,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            core: StateCore::new(continuation_token, username, correlation_id),
        }
    }
}

impl_state_accessors!(SignInAfterSignUpState);

/// Sign-up flow: a one-time code was sent and must be submitted next.
#[derive(Debug, Clone)]
pub struct SignUpCodeSentState {
    core: Arc<StateCore>,
    sent_to: String,
    channel: ChallengeChannel,
    code_length: u32,
}

impl SignUpCodeSentState {
    pub(crate) fn new(
        continuation_token: impl Into<String>,
        username: impl Into<String>,
        correlation_id: Uuid,
        sent_to: impl Into<String>,
        channel: ChallengeChannel,
        code_length: u32,
    ) -> Self {
        Self {
            core: StateCore::new(continuation_token, username, correlation_id),
            sent_to: sent_to.into(),
            channel,
            code_length,
        }
    }

    /// Masked label of the code target.
    #[must_use]
    pub fn sent_to(&self) -> &str {
        &self.sent_to
    }

    /// Delivery channel of the code.
    #[must_use]
    pub fn channel(&self) -> ChallengeChannel {
        self.channel
    }

    /// Length of the code that was sent.
    #[must_use]
    pub fn code_length(&self) -> u32 {
        self.code_length
    }
}

impl_state_accessors!(SignUpCodeSentState);

/// Sign-up flow: the server requires a password to create the account.
#[derive(Debug, Clone)]
pub struct SignUpPasswordRequiredState {
    core: Arc<StateCore>,
}

impl SignUpPasswordRequiredState {
    pub(crate) fn new(
        continuation_token: impl Into<String>,
        username: impl Into<String>,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            core: StateCore::new(continuation_token, username, correlation_id),
        }
    }
}

impl_state_accessors!(SignUpPasswordRequiredState);

/// Sign-up flow: the server requires further attributes to create the account.
#[derive(Debug, Clone)]
pub struct SignUpAttributesRequiredState {
    core: Arc<StateCore>,
    required_attributes: Vec<RequiredAttribute>,
}

impl SignUpAttributesRequiredState {
    pub(crate) fn new(
        continuation_token: impl Into<String>,
        username: impl Into<String>,
        correlation_id: Uuid,
        required_attributes: Vec<RequiredAttribute>,
    ) -> Self {
        Self {
            core: StateCore::new(continuation_token, username, correlation_id),
            required_attributes,
        }
    }

    /// The attributes the server still requires.
    #[must_use]
    pub fn required_attributes(&self) -> &[RequiredAttribute] {
        &self.required_attributes
    }
}

impl_state_accessors!(SignUpAttributesRequiredState);
