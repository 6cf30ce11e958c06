//! Backend entry-point: initialises logging and the store, then serves HTTP.

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::domain::RegistrationService;
use backend::domain::ports::UserStore;
use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::FileStore;
use backend::server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = ServerConfig::from_env()?;
    let store =
        FileStore::new(config.store_path().to_path_buf()).with_lock_timeout(config.lock_timeout());
    store.ensure_initialized().await.map_err(|err| {
        std::io::Error::other(format!(
            "initialising store at {}: {err}",
            config.store_path().display()
        ))
    })?;

    // Startup is process-wide, not tied to any registration attempt, so the
    // event carries no correlation id or email.
    info!(store_path = %config.store_path().display(), "app_startup");

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state,
        RegistrationService::new(store),
        &config,
    )?;
    server.await
}
