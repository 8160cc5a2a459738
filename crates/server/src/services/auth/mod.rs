//! Authentication service.
//!
//! Provides username/password sign-up and login. Passwords are hashed with
//! Argon2id and a random salt; hashes never leave this module and the store.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{info, instrument};

use basket_core::Username;

use crate::db::{RepositoryError, Store};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip(self, password, password_confirm))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;

        if password != password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user(&username, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username or password is
    /// wrong, including malformed usernames.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStore, UserStore};

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(
            hash_password("same password").unwrap(),
            hash_password("same password").unwrap()
        );
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = InMemoryStore::new();
        let auth = AuthService::new(&store);

        let user = auth
            .register("alice", "password123", "password123")
            .await
            .unwrap();
        assert_eq!(user.username.as_str(), "alice");

        let logged_in = auth.login("alice", "password123").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let (_, stored_hash) = store
            .get_password_hash(&user.username)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored_hash, "password123");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = InMemoryStore::new();
        let auth = AuthService::new(&store);

        assert!(matches!(
            auth.register("alice", "password123", "password124").await,
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            auth.register("alice", "short", "short").await,
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            auth.register("not valid!", "password123", "password123").await,
            Err(AuthError::InvalidUsername(_))
        ));

        auth.register("alice", "password123", "password123")
            .await
            .unwrap();
        assert!(matches!(
            auth.register("alice", "password456", "password456").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_login_does_not_reveal_which_part_failed() {
        let store = InMemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register("alice", "password123", "password123")
            .await
            .unwrap();

        for (username, password) in [
            ("alice", "wrong-password"),
            ("nobody", "password123"),
            ("bad name!", "password123"),
        ] {
            assert!(matches!(
                auth.login(username, password).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }
}
