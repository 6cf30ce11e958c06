//! Domain primitives, ports and the registration use case.
//!
//! Purpose: keep the registration core transport-agnostic. Inbound adapters
//! translate HTTP to these types and back; outbound adapters implement the
//! ports. Types are immutable once constructed; each documents its own
//! invariants and serde contract.
//!
//! Public surface:
//! - [`User`], [`UserId`], [`Email`] — the persisted registration record.
//! - [`RegistrationService`] / [`RegistrationError`] — the register-user use
//!   case and its outcome taxonomy.
//! - [`ports`] — driven ports ([`ports::UserStore`]) and their errors.
//! - [`CorrelationId`] — per-attempt identifier threading log events.
//! - [`Error`] / [`ErrorCode`] — the client-facing error payload.

pub mod correlation;
pub mod error;
pub mod ports;
pub mod registration;
pub mod user;

pub use self::correlation::{CORRELATION_ID_HEADER, CorrelationId};
pub use self::error::{Error, ErrorCode};
pub use self::registration::{RegistrationError, RegistrationService};
pub use self::user::{Email, User, UserId};
