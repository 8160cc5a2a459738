//! Session middleware configuration.
//!
//! Sessions live in `PostgreSQL` in production (`tower_sessions.session`) and
//! in memory under test; both go through [`create_session_layer`].

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::BasketConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "basket_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the `PostgreSQL` session store.
///
/// The sessions table is created by the server migrations.
#[must_use]
pub fn postgres_session_store(pool: &PgPool) -> PostgresStore {
    PostgresStore::new(pool.clone())
}

/// Create the session layer over any store.
///
/// # Arguments
///
/// * `store` - Session store
/// * `config` - Server configuration (cookie `Secure` flag follows the base URL scheme)
#[must_use]
pub fn create_session_layer<S>(store: S, config: &BasketConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
