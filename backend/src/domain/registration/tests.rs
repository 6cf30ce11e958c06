//! Regression coverage for this module.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::*;
use crate::domain::ports::FixtureUserStore;

fn service() -> RegistrationService<FixtureUserStore> {
    RegistrationService::new(FixtureUserStore::new())
}

fn existing_user(email: &str) -> User {
    User::new(
        UserId::random(),
        "Existing".into(),
        Email::new(email),
        Utc::now(),
    )
}

#[tokio::test]
async fn register_assigns_identity_and_timestamp() {
    let service = service();
    let user = service
        .register("Ada".into(), Email::new("ada@example.com"))
        .await
        .expect("registration succeeds");

    assert_eq!(user.name(), "Ada");
    assert_eq!(user.email().as_str(), "ada@example.com");
    assert!(!user.id().to_string().is_empty());
    assert!(*user.created_at() <= Utc::now());
}

#[tokio::test]
async fn registered_user_is_listed_exactly_once() {
    let service = service();
    let user = service
        .register("Ada".into(), Email::new("ada@example.com"))
        .await
        .expect("registration succeeds");

    let listed = service.list_users().await.expect("listing succeeds");
    let matches: Vec<_> = listed.iter().filter(|u| *u == &user).collect();
    assert_eq!(matches.len(), 1);
}

#[tokio::test]
async fn duplicate_email_is_rejected_and_collection_unchanged() {
    let seeded = existing_user("ada@example.com");
    let service = RegistrationService::new(FixtureUserStore::with_users(vec![seeded.clone()]));

    let err = service
        .register("Ada2".into(), Email::new("ada@example.com"))
        .await
        .expect_err("duplicate rejected");
    assert_eq!(
        err,
        RegistrationError::DuplicateEmail {
            email: Email::new("ada@example.com"),
        }
    );

    let listed = service.list_users().await.expect("listing succeeds");
    assert_eq!(listed, vec![seeded]);
}

#[tokio::test]
async fn email_uniqueness_is_case_sensitive() {
    let service = RegistrationService::new(FixtureUserStore::with_users(vec![existing_user(
        "ada@example.com",
    )]));

    service
        .register("Ada".into(), Email::new("Ada@example.com"))
        .await
        .expect("differently-cased email is a distinct key");
    assert_eq!(service.list_users().await.expect("listing").len(), 2);
}

#[tokio::test]
async fn registrations_preserve_insertion_order() {
    let service = service();
    for name in ["a", "b", "c"] {
        service
            .register(name.to_uppercase(), Email::new(format!("{name}@example.com")))
            .await
            .expect("registration succeeds");
    }
    let emails: Vec<_> = service
        .list_users()
        .await
        .expect("listing succeeds")
        .into_iter()
        .map(|u| u.email().as_str().to_owned())
        .collect();
    assert_eq!(
        emails,
        vec!["a@example.com", "b@example.com", "c@example.com"]
    );
}

#[tokio::test]
async fn concurrent_registrations_with_same_email_admit_exactly_one() {
    const ATTEMPTS: usize = 8;

    let service = Arc::new(service());
    let mut handles = Vec::new();
    for i in 0..ATTEMPTS {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .register(format!("Racer {i}"), Email::new("race@example.com"))
                .await
        }));
    }

    let mut successes = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(_) => successes += 1,
            Err(RegistrationError::DuplicateEmail { .. }) => duplicates += 1,
            Err(other) => panic!("unexpected fault: {other}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(duplicates, ATTEMPTS - 1);

    let listed = service.list_users().await.expect("listing succeeds");
    let races: Vec<_> = listed
        .iter()
        .filter(|u| u.email().as_str() == "race@example.com")
        .collect();
    assert_eq!(races.len(), 1);
}

#[tokio::test]
async fn concurrent_registrations_with_distinct_emails_all_succeed() {
    const ATTEMPTS: usize = 8;

    let service = Arc::new(service());
    let mut handles = Vec::new();
    for i in 0..ATTEMPTS {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .register(format!("User {i}"), Email::new(format!("{i}@example.com")))
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("task completes").expect("registration");
    }
    assert_eq!(service.list_users().await.expect("listing").len(), ATTEMPTS);
}

/// Store double whose exclusive cycle always times out on the lock.
struct ContendedStore;

#[async_trait]
impl UserStore for ContendedStore {
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<User>, StoreError> {
        Err(StoreError::corrupt("unexpected read"))
    }

    async fn write_all_atomic(&self, _users: &[User]) -> Result<(), StoreError> {
        Err(StoreError::io("unexpected write"))
    }

    async fn with_exclusive<T, E, F>(&self, _op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut Vec<User>) -> Result<T, E> + Send + 'static,
    {
        Err(StoreError::lock_timeout(10_000).into())
    }
}

#[tokio::test]
async fn store_faults_propagate_unmodified() {
    let service = RegistrationService::new(ContendedStore);
    let err = service
        .register("Ada".into(), Email::new("ada@example.com"))
        .await
        .expect_err("lock timeout propagates");
    assert_eq!(
        err,
        RegistrationError::Store(StoreError::lock_timeout(10_000))
    );
}
