//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use basket_core::{UserId, Username};

/// A registered user (domain type).
///
/// The password hash stays in the persistence and auth layers and is never
/// part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// When the user signed up.
    pub created_at: DateTime<Utc>,
}
