//! Per-request correlation context.
//!
//! Every flow operation carries a [`RequestContext`] so that log lines and
//! server round-trips belonging to one logical operation can be correlated.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Correlation context for a single logical operation.
///
/// The context is created once per flow operation and threaded through the
/// transport and the response validator. It is cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    correlation_id: Uuid,
    created_at: DateTime<Utc>,
}

impl RequestContext {
    /// Create a context with a fresh random correlation id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    /// Create a context with a caller-supplied correlation id.
    ///
    /// Useful when the surrounding application already tracks an operation id
    /// and wants server logs to line up with it.
    #[must_use]
    pub fn with_correlation_id(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            created_at: Utc::now(),
        }
    }

    /// The correlation id attached to every request of this operation.
    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// When this context was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_contexts_do_not_collide() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert_ne!(a.correlation_id(), b.correlation_id());
    }

    #[test]
    fn test_supplied_correlation_id_is_kept() {
        let id = Uuid::new_v4();
        let ctx = RequestContext::with_correlation_id(id);
        assert_eq!(ctx.correlation_id(), id);
    }
}
