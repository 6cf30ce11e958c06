//! Registration use-case service.
//!
//! Implements "register a new user" on top of the [`UserStore`] port: the
//! uniqueness check and the append happen inside one exclusive store cycle,
//! so no interleaving of concurrent attempts can admit two users with the
//! same email. One structured log event is emitted per lifecycle step
//! (`register_attempt`, `register_conflict`, `register_success`), all
//! carrying the attempt's correlation identifier.

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::ports::{StoreError, UserStore};
use crate::domain::{CorrelationId, Email, User, UserId};

/// Failures surfaced by [`RegistrationService::register`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The email is already registered. An expected business rejection, not
    /// a system fault; the collection is left untouched.
    #[error("email already registered: {email}")]
    DuplicateEmail {
        /// The address that collided.
        email: Email,
    },
    /// Operational store fault, propagated unmodified from the port.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates the register-user use case over a [`UserStore`].
///
/// Stateless across calls apart from the store handle; safe to share behind
/// `web::Data` across actix workers.
#[derive(Debug)]
pub struct RegistrationService<S> {
    store: S,
}

impl<S> RegistrationService<S> {
    /// Create a service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: UserStore> RegistrationService<S> {
    /// Register a new user.
    ///
    /// Assigns a fresh identifier and UTC timestamp, appends the record to
    /// the collection and persists it atomically, all under the store's
    /// exclusive lock, so two attempts racing on the same email resolve to
    /// exactly one success and one [`RegistrationError::DuplicateEmail`].
    ///
    /// # Errors
    /// [`RegistrationError::DuplicateEmail`] when the email is already
    /// present (exact, case-sensitive match); store faults pass through
    /// unmodified.
    pub async fn register(&self, name: String, email: Email) -> Result<User, RegistrationError> {
        let correlation_id = CorrelationId::acquire();
        info!(correlation_id = %correlation_id, email = %email, "register_attempt");

        let user = self
            .store
            .with_exclusive(move |users| {
                if users.iter().any(|u| u.email() == &email) {
                    warn!(correlation_id = %correlation_id, email = %email, "register_conflict");
                    return Err(RegistrationError::DuplicateEmail { email });
                }
                let user = User::new(UserId::random(), name, email, Utc::now());
                users.push(user.clone());
                Ok(user)
            })
            .await?;

        info!(
            correlation_id = %correlation_id,
            email = %user.email(),
            user_id = %user.id(),
            "register_success"
        );
        Ok(user)
    }

    /// Return the full user collection.
    ///
    /// A lock-free pass-through to [`UserStore::read_all`]; emits no
    /// lifecycle events.
    ///
    /// # Errors
    /// Store faults pass through unmodified.
    pub async fn list_users(&self) -> Result<Vec<User>, RegistrationError> {
        Ok(self.store.read_all().await?)
    }
}

#[cfg(test)]
mod tests;
