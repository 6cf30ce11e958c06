//! File-backed user registration backend.
//!
//! The crate is organised hexagonally: [`domain`] holds the registration
//! core and its ports, [`outbound`] the file store adapter, [`inbound`] the
//! HTTP surface, with [`server`] assembling the pieces.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::{CORRELATION_ID_HEADER, CorrelationId};
pub use middleware::Correlation;
