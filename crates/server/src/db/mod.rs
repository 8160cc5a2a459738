//! Persistence for users, lists, items and list membership.
//!
//! # Ports and adapters
//!
//! Services talk to storage through the [`Store`] trait, which combines
//! [`UserStore`], [`ListStore`] and [`ItemStore`]:
//!
//! - [`PgStore`] - `PostgreSQL` via the repositories in [`users`], [`lists`]
//!   and [`items`]
//! - [`InMemoryStore`] - process-local maps, used by tests and never by the
//!   server binary
//!
//! # Tables (schema `basket`)
//!
//! - `app_user` - Accounts with argon2 password hashes
//! - `grocery_list` - Lists, their owner and optional share token
//! - `grocery_list_member` - Users who joined a list through its share link
//! - `grocery_item` - Items, cascading with their list
//!
//! Sessions live in `tower_sessions.session`, created by the session store.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/`, embedded in this
//! crate and run via:
//! ```bash
//! cargo run -p basket-cli -- migrate
//! ```

pub mod items;
pub mod lists;
pub mod memory;
pub mod postgres;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use basket_core::{
    GroceryItem, GroceryItemId, GroceryList, GroceryListId, NewGroceryItem, ShareToken, UserId,
    Username,
};

use crate::models::User;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the embedded migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user with an already-hashed password.
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Get a user by username.
    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError>;

    /// Get a user together with their password hash.
    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// List and membership storage.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Create a list and its initial items atomically.
    async fn create_list(
        &self,
        owner: UserId,
        name: &str,
        items: &[NewGroceryItem],
    ) -> Result<GroceryList, RepositoryError>;

    /// Get a list with its shared set.
    async fn get_list(&self, id: GroceryListId) -> Result<Option<GroceryList>, RepositoryError>;

    /// Get the list carrying a share token.
    async fn get_list_by_token(
        &self,
        token: &ShareToken,
    ) -> Result<Option<GroceryList>, RepositoryError>;

    /// Lists owned by `user` followed by lists shared with them, each group
    /// in ascending id order.
    async fn lists_for_user(&self, user: UserId) -> Result<Vec<GroceryList>, RepositoryError>;

    /// Rename a list when `name` is set, delete every item and insert
    /// `items`, atomically.
    ///
    /// Returns `RepositoryError::NotFound` if the list does not exist.
    async fn update_list(
        &self,
        id: GroceryListId,
        name: Option<&str>,
        items: &[NewGroceryItem],
    ) -> Result<(), RepositoryError>;

    /// Delete a list, its items and its membership rows.
    ///
    /// Returns `true` if a list was deleted.
    async fn delete_list(&self, id: GroceryListId) -> Result<bool, RepositoryError>;

    /// Store `token` on the list unless it already has one, and return the
    /// token the list ends up with.
    ///
    /// Returns `RepositoryError::Conflict` if another list already uses
    /// `token`, and `RepositoryError::NotFound` if the list does not exist.
    async fn set_share_token(
        &self,
        id: GroceryListId,
        token: &ShareToken,
    ) -> Result<ShareToken, RepositoryError>;

    /// Add `user` to the list's shared set.
    ///
    /// Returns `true` if a membership row was inserted, `false` if it
    /// already existed.
    async fn add_member(&self, id: GroceryListId, user: UserId) -> Result<bool, RepositoryError>;
}

/// Item storage.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Items of a list in ascending id order.
    async fn list_items(&self, list: GroceryListId) -> Result<Vec<GroceryItem>, RepositoryError>;

    /// Get an item by ID.
    async fn get_item(&self, id: GroceryItemId) -> Result<Option<GroceryItem>, RepositoryError>;

    /// Append an item to a list.
    ///
    /// Returns `RepositoryError::NotFound` if the list does not exist.
    async fn add_item(
        &self,
        list: GroceryListId,
        item: &NewGroceryItem,
    ) -> Result<GroceryItem, RepositoryError>;

    /// Overwrite an item's name, quantity, price and image.
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    async fn update_item(&self, item: &GroceryItem) -> Result<(), RepositoryError>;

    /// Delete an item. Returns `true` if an item was deleted.
    async fn delete_item(&self, id: GroceryItemId) -> Result<bool, RepositoryError>;
}

/// Everything the services need from storage.
#[async_trait]
pub trait Store: UserStore + ListStore + ItemStore {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}
