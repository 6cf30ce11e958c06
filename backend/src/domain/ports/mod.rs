//! Domain ports for the hexagonal boundary.

mod user_store;

pub use user_store::{FixtureUserStore, StoreError, UserStore};
