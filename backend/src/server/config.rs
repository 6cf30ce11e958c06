//! HTTP server configuration sourced from the process environment.

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the backing store file.
const USERS_FILE_VAR: &str = "USERS_FILE";
/// Environment variable naming the listen address.
const BIND_ADDR_VAR: &str = "BIND_ADDR";
/// Environment variable bounding the store lock wait, in whole seconds.
const LOCK_TIMEOUT_VAR: &str = "STORE_LOCK_TIMEOUT_SECS";

const DEFAULT_STORE_PATH: &str = "users.json";
const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
    8080,
);
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings the bootstrap assembles before starting the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    bind_addr: SocketAddr,
    store_path: PathBuf,
    lock_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Construct a configuration from explicit values.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, store_path: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        Self {
            bind_addr,
            store_path: store_path.into(),
            lock_timeout,
        }
    }

    /// Read the configuration from the environment, falling back to defaults
    /// (`users.json` next to the process, `0.0.0.0:8080`, 10 s lock wait).
    ///
    /// # Errors
    /// Returns [`std::io::Error`] when a variable is set but unparsable, so
    /// a typo fails the boot instead of silently using a default.
    pub fn from_env() -> std::io::Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var(BIND_ADDR_VAR) {
            config.bind_addr = raw.parse().map_err(|err| {
                std::io::Error::other(format!("invalid {BIND_ADDR_VAR} `{raw}`: {err}"))
            })?;
        }
        if let Ok(raw) = env::var(USERS_FILE_VAR) {
            config.store_path = PathBuf::from(raw);
        }
        if let Ok(raw) = env::var(LOCK_TIMEOUT_VAR) {
            let secs: u64 = raw.parse().map_err(|err| {
                std::io::Error::other(format!("invalid {LOCK_TIMEOUT_VAR} `{raw}`: {err}"))
            })?;
            config.lock_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Socket address the server binds to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Path of the backing store file.
    #[must_use]
    pub fn store_path(&self) -> &Path {
        self.store_path.as_path()
    }

    /// Bounded wait for the store lock.
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }
}
