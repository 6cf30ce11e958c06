//! Regression coverage for this module.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fs2::FileExt;
use tempfile::TempDir;

use super::*;
use crate::domain::{Email, UserId};

fn store_in(dir: &TempDir) -> FileStore {
    FileStore::new(dir.path().join("users.json"))
}

fn user(email: &str) -> User {
    User::new(
        UserId::random(),
        "Test".into(),
        Email::new(email),
        Utc::now(),
    )
}

#[tokio::test]
async fn ensure_initialized_creates_empty_collection() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);

    store.ensure_initialized().await.expect("init");
    assert!(store.path().exists());
    assert!(store.read_all().await.expect("read").is_empty());
}

#[tokio::test]
async fn ensure_initialized_is_idempotent_and_preserves_data() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    store.ensure_initialized().await.expect("init");

    let users = vec![user("a@example.com")];
    store.write_all_atomic(&users).await.expect("write");

    store.ensure_initialized().await.expect("second init");
    assert_eq!(store.read_all().await.expect("read"), users);
}

#[tokio::test]
async fn ensure_initialized_creates_missing_parent_directories() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileStore::new(dir.path().join("state/nested/users.json"));

    store.ensure_initialized().await.expect("init");
    assert!(store.path().exists());
}

#[tokio::test]
async fn read_all_without_backing_file_is_an_io_fault() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);

    let err = store.read_all().await.expect_err("missing file");
    assert!(matches!(err, StoreError::Io { .. }), "got {err:?}");
}

#[tokio::test]
async fn read_all_rejects_unparsable_contents() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    fs::write(store.path(), b"{ not a user collection").expect("write garbage");

    let err = store.read_all().await.expect_err("corrupt file");
    assert!(matches!(err, StoreError::Corrupt { .. }), "got {err:?}");
}

#[tokio::test]
async fn read_all_rejects_records_with_invalid_ids() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    fs::write(
        store.path(),
        br#"[{"id":"not-a-uuid","name":"Ada","email":"ada@example.com","created_at":"2024-05-01T12:00:00Z"}]"#,
    )
    .expect("write record");

    let err = store.read_all().await.expect_err("invalid id");
    assert!(matches!(err, StoreError::Corrupt { .. }), "got {err:?}");
}

#[tokio::test]
async fn write_all_atomic_round_trips_and_preserves_order() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    store.ensure_initialized().await.expect("init");

    let users = vec![
        user("a@example.com"),
        user("b@example.com"),
        user("c@example.com"),
    ];
    store.write_all_atomic(&users).await.expect("write");
    assert_eq!(store.read_all().await.expect("read"), users);
}

#[tokio::test]
async fn abandoned_temp_files_do_not_disturb_the_collection() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    store.ensure_initialized().await.expect("init");

    let users = vec![user("a@example.com")];
    store.write_all_atomic(&users).await.expect("write");

    // A writer that died between temp-file write and rename leaves a stray
    // sibling behind; the canonical file must stay intact and parsable.
    fs::write(dir.path().join(".tmpXYZ123"), b"partial garbage").expect("stray temp");
    assert_eq!(store.read_all().await.expect("read"), users);
}

#[tokio::test]
async fn lock_held_elsewhere_times_out() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir).with_lock_timeout(Duration::from_millis(200));
    store.ensure_initialized().await.expect("init");

    let lock_path = dir.path().join("users.json.lock");
    let holder = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .expect("open lock file");
    holder.try_lock_exclusive().expect("hold lock");

    let err = store
        .write_all_atomic(&[user("a@example.com")])
        .await
        .expect_err("lock contended");
    assert!(matches!(err, StoreError::LockTimeout { .. }), "got {err:?}");

    FileExt::unlock(&holder).expect("release lock");
}

#[tokio::test]
async fn lock_is_released_after_failed_cycle() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    store.ensure_initialized().await.expect("init");

    let rejected: Result<(), StoreError> = store
        .with_exclusive(|_users| Err(StoreError::corrupt("rejected")))
        .await;
    assert!(rejected.is_err());

    // A leaked guard would make this second cycle time out.
    store
        .with_exclusive(|users| {
            users.push(user("a@example.com"));
            Ok::<_, StoreError>(())
        })
        .await
        .expect("lock available again");
    assert_eq!(store.read_all().await.expect("read").len(), 1);
}

#[tokio::test]
async fn failed_cycle_leaves_previous_state_intact() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    store.ensure_initialized().await.expect("init");
    let users = vec![user("a@example.com")];
    store.write_all_atomic(&users).await.expect("write");

    let rejected: Result<(), StoreError> = store
        .with_exclusive(|found| {
            found.clear();
            Err(StoreError::corrupt("rejected"))
        })
        .await;
    assert!(rejected.is_err());
    assert_eq!(store.read_all().await.expect("read"), users);
}

#[tokio::test]
async fn concurrent_exclusive_cycles_lose_no_updates() {
    const WRITERS: usize = 8;

    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(store_in(&dir));
    store.ensure_initialized().await.expect("init");

    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .with_exclusive(move |users| {
                    users.push(user(&format!("{i}@example.com")));
                    Ok::<_, StoreError>(())
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("task").expect("cycle");
    }

    let emails: Vec<_> = store
        .read_all()
        .await
        .expect("read")
        .into_iter()
        .map(|u| u.email().as_str().to_owned())
        .collect();
    assert_eq!(emails.len(), WRITERS);
    for i in 0..WRITERS {
        assert!(emails.contains(&format!("{i}@example.com")));
    }
}

#[tokio::test]
async fn concurrent_cycles_checking_uniqueness_admit_exactly_one() {
    const WRITERS: usize = 6;

    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(store_in(&dir));
    store.ensure_initialized().await.expect("init");

    let mut handles = Vec::new();
    for _ in 0..WRITERS {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .with_exclusive(|users| {
                    if users
                        .iter()
                        .any(|u| u.email().as_str() == "race@example.com")
                    {
                        return Err(StoreError::corrupt("duplicate"));
                    }
                    users.push(user("race@example.com"));
                    Ok::<_, StoreError>(())
                })
                .await
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.expect("task").is_ok() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(store.read_all().await.expect("read").len(), 1);
}
