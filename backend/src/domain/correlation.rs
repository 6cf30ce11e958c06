//! Per-attempt correlation identifier threaded through log events.
//!
//! Every registration attempt gets one `CorrelationId`; the lifecycle events
//! emitted for that attempt all carry it, so log consumers can join them back
//! together. The identifier lives in task-local storage so handlers and the
//! service read it without explicit parameter threading.
//!
//! Tokio task-local variables are not inherited across spawned tasks. Use
//! [`CorrelationId::scope`] when spawning new tasks or moving work onto
//! blocking threads so the active identifier propagates correctly.

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

/// Response header carrying the request's correlation identifier.
pub const CORRELATION_ID_HEADER: &str = "correlation-id";

task_local! {
    /// Task-local storage for the current correlation identifier.
    pub(crate) static CORRELATION_ID: CorrelationId;
}

/// Identifier correlating all events of one registration attempt.
///
/// # Examples
/// ```
/// use backend::CorrelationId;
///
/// async fn handler() {
///     if let Some(id) = CorrelationId::current() {
///         tracing::info!(correlation_id = %id, "handling request");
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new random correlation identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct a correlation identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the current identifier if one is in scope.
    #[must_use]
    pub fn current() -> Option<Self> {
        CORRELATION_ID.try_with(|id| *id).ok()
    }

    /// Returns the identifier in scope, or a freshly generated one.
    ///
    /// The correlation middleware scopes an identifier around every HTTP
    /// request; callers outside a request (tests, background work) still get
    /// a usable identifier this way.
    #[must_use]
    pub fn acquire() -> Self {
        Self::current().unwrap_or_else(Self::generate)
    }

    /// Access the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Execute the provided future with the supplied identifier in scope.
    ///
    /// # Examples
    /// ```
    /// use backend::CorrelationId;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let id: CorrelationId = "00000000-0000-0000-0000-000000000000"
    ///     .parse()
    ///     .expect("valid UUID");
    /// let observed = CorrelationId::scope(id, async move { CorrelationId::current() }).await;
    /// assert_eq!(observed, Some(id));
    /// # });
    /// ```
    pub async fn scope<Fut>(id: CorrelationId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        CORRELATION_ID.scope(id, fut).await
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CorrelationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[tokio::test]
    async fn generate_produces_uuid() {
        let id = CorrelationId::generate();
        let parsed = Uuid::parse_str(&id.to_string()).expect("valid UUID");
        assert_eq!(parsed.to_string(), id.to_string());
    }

    #[tokio::test]
    async fn current_reflects_scope() {
        let expected = CorrelationId::generate();
        let observed = CorrelationId::scope(expected, async move { CorrelationId::current() }).await;
        assert_eq!(observed, Some(expected));
    }

    #[tokio::test]
    async fn current_is_none_out_of_scope() {
        assert!(CorrelationId::current().is_none());
    }

    #[tokio::test]
    async fn acquire_reuses_scoped_identifier() {
        let expected = CorrelationId::generate();
        let observed = CorrelationId::scope(expected, async move { CorrelationId::acquire() }).await;
        assert_eq!(observed, expected);
    }

    #[test]
    fn acquire_generates_out_of_scope() {
        let a = CorrelationId::acquire();
        let b = CorrelationId::acquire();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn from_str_round_trips() {
        let uuid = Uuid::nil();
        let id: CorrelationId = uuid.to_string().parse().expect("parse uuid");
        assert_eq!(id.to_string(), uuid.to_string());
    }
}
