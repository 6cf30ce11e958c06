//! File-backed implementation of the user store port.
//!
//! The whole collection lives in one JSON file. Mutations rewrite the file
//! through a temporary sibling plus an atomic rename, so a reader never
//! observes a half-written state: it sees either the fully-old or the
//! fully-new file. Exclusion between read-modify-write cycles comes from a
//! `.lock` side-file locked with `flock`-style OS primitives, which holds
//! across processes sharing the storage path, not only across tasks inside
//! one process.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::domain::User;
use crate::domain::ports::{StoreError, UserStore};

/// Default bounded wait for the store lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay between lock acquisition attempts while waiting.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// File-backed [`UserStore`] adapter.
///
/// # Examples
/// ```no_run
/// use backend::domain::ports::UserStore;
/// use backend::outbound::persistence::FileStore;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = FileStore::new("users.json");
/// store.ensure_initialized().await?;
/// # Ok::<(), backend::domain::ports::StoreError>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl FileStore {
    /// Create a store over `path` with the default lock timeout.
    ///
    /// The lock side-file lives next to the backing file, named after it
    /// with a `.lock` suffix.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".lock");
        Self {
            lock_path: PathBuf::from(lock_name),
            path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Replace the bounded wait used when acquiring the lock.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn load(&self) -> Result<Vec<User>, StoreError> {
        let bytes = fs::read(&self.path)
            .map_err(|err| StoreError::io(format!("reading {}: {err}", self.path.display())))?;
        serde_json::from_slice(&bytes).map_err(|err| StoreError::corrupt(err.to_string()))
    }

    /// Write the collection to a temporary sibling and rename it into place.
    ///
    /// On any failure the temporary file is abandoned and the canonical file
    /// keeps its previous contents. Callers must hold the store lock.
    fn persist(&self, users: &[User]) -> Result<(), StoreError> {
        let tmp = self.write_temp(users)?;
        tmp.persist(&self.path)
            .map_err(|err| StoreError::io(format!("replacing {}: {err}", self.path.display())))?;
        Ok(())
    }

    fn write_temp(&self, users: &[User]) -> Result<NamedTempFile, StoreError> {
        let mut tmp = NamedTempFile::new_in(self.parent_dir())
            .map_err(|err| StoreError::io(format!("creating temp file: {err}")))?;
        let bytes = serde_json::to_vec_pretty(users)
            .map_err(|err| StoreError::io(format!("encoding user collection: {err}")))?;
        tmp.write_all(&bytes)
            .map_err(|err| StoreError::io(format!("writing temp file: {err}")))?;
        tmp.as_file()
            .sync_all()
            .map_err(|err| StoreError::io(format!("syncing temp file: {err}")))?;
        Ok(tmp)
    }

    /// Acquire the exclusive store lock, polling up to the configured
    /// timeout.
    async fn acquire_lock(&self) -> Result<StoreLockGuard, StoreError> {
        let started = Instant::now();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.lock_path)
            .map_err(|err| {
                StoreError::io(format!("opening {}: {err}", self.lock_path.display()))
            })?;

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!(path = %self.lock_path.display(), "store lock acquired");
                    return Ok(StoreLockGuard { file });
                }
                Err(err) if is_contended(&err) => {
                    if started.elapsed() >= self.lock_timeout {
                        return Err(StoreError::lock_timeout(
                            u64::try_from(self.lock_timeout.as_millis()).unwrap_or(u64::MAX),
                        ));
                    }
                    tokio::time::sleep(LOCK_POLL_INTERVAL).await;
                }
                Err(err) => {
                    return Err(StoreError::io(format!(
                        "locking {}: {err}",
                        self.lock_path.display()
                    )));
                }
            }
        }
    }
}

fn is_contended(err: &std::io::Error) -> bool {
    err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Holds the exclusive lock; released on drop, so every exit path of a
/// cycle (success, error or early return) gives the lock back.
struct StoreLockGuard {
    file: File,
}

impl Drop for StoreLockGuard {
    fn drop(&mut self) {
        // Unlock errors are unreportable here; the descriptor closes right
        // after and closing releases the lock as well.
        let _unlock = FileExt::unlock(&self.file);
    }
}

#[async_trait]
impl UserStore for FileStore {
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent)
            .map_err(|err| StoreError::io(format!("creating {}: {err}", parent.display())))?;
        if self.path.exists() {
            return Ok(());
        }

        // First boot: materialise an empty collection. `persist_noclobber`
        // keeps initialisation race-free when several processes start
        // against the same path.
        let tmp = self.write_temp(&[])?;
        match tmp.persist_noclobber(&self.path) {
            Ok(_) => {
                debug!(path = %self.path.display(), "store initialised empty");
                Ok(())
            }
            Err(err) if err.error.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(err) => Err(StoreError::io(format!(
                "initialising {}: {err}",
                self.path.display()
            ))),
        }
    }

    async fn read_all(&self) -> Result<Vec<User>, StoreError> {
        self.load()
    }

    async fn write_all_atomic(&self, users: &[User]) -> Result<(), StoreError> {
        let _guard = self.acquire_lock().await?;
        self.persist(users)
    }

    async fn with_exclusive<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut Vec<User>) -> Result<T, E> + Send + 'static,
    {
        let _guard = self.acquire_lock().await.map_err(E::from)?;
        let mut users = self.load().map_err(E::from)?;
        let value = op(&mut users)?;
        self.persist(&users).map_err(E::from)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests;
