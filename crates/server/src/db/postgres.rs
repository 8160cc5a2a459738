//! `PostgreSQL` implementation of the storage ports.

use async_trait::async_trait;
use sqlx::PgPool;

use basket_core::{
    GroceryItem, GroceryItemId, GroceryList, GroceryListId, NewGroceryItem, ShareToken, UserId,
    Username,
};

use super::items::ItemRepository;
use super::lists::ListRepository;
use super::users::UserRepository;
use super::{ItemStore, ListStore, RepositoryError, Store, UserStore};
use crate::models::User;

/// Storage backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool)
            .create_with_password(username, password_hash)
            .await
    }

    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool)
            .get_by_username(username)
            .await
    }

    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        UserRepository::new(&self.pool)
            .get_password_hash(username)
            .await
    }
}

#[async_trait]
impl ListStore for PgStore {
    async fn create_list(
        &self,
        owner: UserId,
        name: &str,
        items: &[NewGroceryItem],
    ) -> Result<GroceryList, RepositoryError> {
        ListRepository::new(&self.pool)
            .create(owner, name, items)
            .await
    }

    async fn get_list(&self, id: GroceryListId) -> Result<Option<GroceryList>, RepositoryError> {
        ListRepository::new(&self.pool).get_by_id(id).await
    }

    async fn get_list_by_token(
        &self,
        token: &ShareToken,
    ) -> Result<Option<GroceryList>, RepositoryError> {
        ListRepository::new(&self.pool)
            .get_by_share_token(token)
            .await
    }

    async fn lists_for_user(&self, user: UserId) -> Result<Vec<GroceryList>, RepositoryError> {
        ListRepository::new(&self.pool).for_user(user).await
    }

    async fn update_list(
        &self,
        id: GroceryListId,
        name: Option<&str>,
        items: &[NewGroceryItem],
    ) -> Result<(), RepositoryError> {
        ListRepository::new(&self.pool).update(id, name, items).await
    }

    async fn delete_list(&self, id: GroceryListId) -> Result<bool, RepositoryError> {
        ListRepository::new(&self.pool).delete(id).await
    }

    async fn set_share_token(
        &self,
        id: GroceryListId,
        token: &ShareToken,
    ) -> Result<ShareToken, RepositoryError> {
        ListRepository::new(&self.pool)
            .set_share_token(id, token)
            .await
    }

    async fn add_member(&self, id: GroceryListId, user: UserId) -> Result<bool, RepositoryError> {
        ListRepository::new(&self.pool).add_member(id, user).await
    }
}

#[async_trait]
impl ItemStore for PgStore {
    async fn list_items(&self, list: GroceryListId) -> Result<Vec<GroceryItem>, RepositoryError> {
        ItemRepository::new(&self.pool).for_list(list).await
    }

    async fn get_item(&self, id: GroceryItemId) -> Result<Option<GroceryItem>, RepositoryError> {
        ItemRepository::new(&self.pool).get_by_id(id).await
    }

    async fn add_item(
        &self,
        list: GroceryListId,
        item: &NewGroceryItem,
    ) -> Result<GroceryItem, RepositoryError> {
        ItemRepository::new(&self.pool).create(list, item).await
    }

    async fn update_item(&self, item: &GroceryItem) -> Result<(), RepositoryError> {
        ItemRepository::new(&self.pool).update(item).await
    }

    async fn delete_item(&self, id: GroceryItemId) -> Result<bool, RepositoryError> {
        ItemRepository::new(&self.pool).delete(id).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
