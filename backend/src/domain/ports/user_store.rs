//! Driven port for user collection persistence.
//!
//! In hexagonal terms this is a *driven* port: the registration service calls
//! it to read and mutate the persisted user collection without knowing the
//! backing infrastructure. The contract is the concurrency story of the whole
//! system, so it is spelled out here rather than in any adapter:
//!
//! - [`UserStore::with_exclusive`] serialises read-modify-write cycles. At
//!   most one such cycle runs at a time, and the mutated collection becomes
//!   visible atomically or not at all.
//! - [`UserStore::read_all`] takes no lock. Standalone readers may observe a
//!   snapshot that a concurrent writer is about to supersede, but never a
//!   partially written one.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::User;

/// Persistence faults raised by user store adapters.
///
/// All variants are operational faults: the service propagates them
/// unmodified and never retries internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The exclusive lock was not acquired within the bounded wait.
    #[error("store lock not acquired within {waited_ms} ms")]
    LockTimeout {
        /// How long the caller waited before giving up.
        waited_ms: u64,
    },
    /// Reading, writing or replacing the backing state failed. The previously
    /// persisted state is intact.
    #[error("store I/O failed: {message}")]
    Io {
        /// Underlying failure description.
        message: String,
    },
    /// The backing state exists but is not a valid serialised user
    /// collection. Operator intervention is required; there is no automatic
    /// repair.
    #[error("store contents are not a valid user collection: {message}")]
    Corrupt {
        /// Underlying parse failure description.
        message: String,
    },
}

impl StoreError {
    /// Lock acquisition gave up after `waited_ms` milliseconds.
    #[must_use]
    pub const fn lock_timeout(waited_ms: u64) -> Self {
        Self::LockTimeout { waited_ms }
    }

    /// Wrap an I/O failure description.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Wrap a parse failure description.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

/// Port over the persisted user collection.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an empty persisted collection if none exists yet.
    ///
    /// Idempotent; never alters an already-initialised collection. Called
    /// once at process bootstrap.
    async fn ensure_initialized(&self) -> Result<(), StoreError>;

    /// Load the current collection without taking the lock.
    ///
    /// Callers needing a consistent read-then-write cycle must use
    /// [`UserStore::with_exclusive`] instead; a standalone read tolerates a
    /// concurrently superseded snapshot because writes are atomic.
    async fn read_all(&self) -> Result<Vec<User>, StoreError>;

    /// Replace the whole persisted collection atomically, under the lock.
    ///
    /// Concurrent readers observe either the fully-old or fully-new state.
    /// On failure the previous state remains intact.
    async fn write_all_atomic(&self, users: &[User]) -> Result<(), StoreError>;

    /// Run `op` as one exclusive read-modify-write cycle.
    ///
    /// Acquires the lock, loads the current collection, applies `op` to it
    /// and, if `op` succeeds, persists the result atomically. An `Err` from
    /// `op` aborts the cycle with no write, which is how domain rejections
    /// (such as a duplicate email) leave the collection untouched. The lock
    /// is released on every exit path.
    async fn with_exclusive<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut Vec<User>) -> Result<T, E> + Send + 'static;
}

/// In-memory store used by service and handler tests.
///
/// Mirrors the file adapter's semantics: `with_exclusive` serialises cycles
/// behind an async mutex and abandons the mutation when the closure fails.
#[derive(Debug, Default)]
pub struct FixtureUserStore {
    users: Mutex<Vec<User>>,
}

impl FixtureUserStore {
    /// Create an empty fixture store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fixture store pre-populated with `users`.
    #[must_use]
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }
}

#[async_trait]
impl UserStore for FixtureUserStore {
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.lock().await.clone())
    }

    async fn write_all_atomic(&self, users: &[User]) -> Result<(), StoreError> {
        *self.users.lock().await = users.to_vec();
        Ok(())
    }

    async fn with_exclusive<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut Vec<User>) -> Result<T, E> + Send + 'static,
    {
        let mut guard = self.users.lock().await;
        // Work on a copy so a failing closure leaves the stored state
        // untouched, matching the file adapter.
        let mut draft = guard.clone();
        let value = op(&mut draft)?;
        *guard = draft;
        Ok(value)
    }
}
