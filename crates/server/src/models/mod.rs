//! Domain models for the server.
//!
//! Lists and items live in `basket-core`; this module holds the types that
//! only the server needs.

pub mod session;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
