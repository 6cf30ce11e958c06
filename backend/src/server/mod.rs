//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Correlation;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::registration::{list_users, register};
use crate::inbound::http::state::HttpRegistration;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    registration: web::Data<HttpRegistration>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        registration,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(registration)
        .wrap(Correlation)
        .service(register)
        .service(list_users)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an actix HTTP server serving the registration API.
///
/// # Parameters
/// - `health_state`: shared probe state, marked ready once the listener is
///   bound.
/// - `registration`: the registration service over the already-initialised
///   store.
/// - `config`: pre-built [`ServerConfig`] with the bind address.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    registration: HttpRegistration,
    config: &ServerConfig,
) -> std::io::Result<Server> {
    let registration = web::Data::new(registration);
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            registration: registration.clone(),
        })
    })
    .bind(config.bind_addr())?
    .run();

    health_state.mark_ready();
    Ok(server)
}
