//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Sign-up and password login
//! - `access` - List authorization, share-token issuance and redemption
//! - `lists` - List creation, catalogue replacement, rename, delete, dashboard
//! - `items` - Free-form item add, edit and delete
//!
//! Services borrow the [`Store`](crate::db::Store) for the duration of one
//! request and never hold state of their own.

pub mod access;
pub mod auth;
mod error;
pub mod items;
pub mod lists;

pub use access::{AccessService, Redemption};
pub use auth::{AuthError, AuthService};
pub use error::GroceryError;
pub use items::ItemService;
pub use lists::{ListService, ListView};
