//! User management commands.

use basket_server::db::PgStore;
use basket_server::services::{AuthError, AuthService};

use super::{ConnectError, connect};

/// Errors that can occur while managing users.
#[derive(Debug, thiserror::Error)]
pub enum UserCommandError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a user with a password.
///
/// # Errors
///
/// Returns an error if the username is invalid or taken, the password is too
/// short, or the database is unreachable.
pub async fn create(username: &str, password: &str) -> Result<(), UserCommandError> {
    let store = PgStore::new(connect().await?);

    let user = AuthService::new(&store)
        .register(username, password, password)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}",
        user.id,
        user.username
    );
    Ok(())
}
