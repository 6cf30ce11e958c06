//! Shared handler state.

use crate::domain::RegistrationService;
use crate::outbound::persistence::FileStore;

/// Registration service variant served over HTTP.
///
/// Handlers receive it through `web::Data`, so one instance is shared across
/// all actix workers.
pub type HttpRegistration = RegistrationService<FileStore>;
