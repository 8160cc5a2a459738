//! In-memory implementation of the storage ports.
//!
//! Mirrors the `PostgreSQL` schema closely enough for service and router
//! tests: serial ids, unique usernames and share tokens, cascading deletes
//! and set semantics for membership. Not used by the server binary.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use basket_core::{
    GroceryItem, GroceryItemId, GroceryList, GroceryListId, NewGroceryItem, ShareToken, UserId,
    Username,
};

use super::{ItemStore, ListStore, RepositoryError, Store, UserStore};
use crate::models::User;

#[derive(Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
}

#[derive(Clone)]
struct ListRecord {
    name: String,
    owner: UserId,
    share_token: Option<ShareToken>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: BTreeMap<UserId, UserRecord>,
    lists: BTreeMap<GroceryListId, ListRecord>,
    members: BTreeSet<(GroceryListId, UserId)>,
    items: BTreeMap<GroceryItemId, GroceryItem>,
}

impl Tables {
    const fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn list(&self, id: GroceryListId) -> Option<GroceryList> {
        let record = self.lists.get(&id)?;
        let shared_with = self
            .members
            .iter()
            .filter(|(list, _)| *list == id)
            .map(|(_, user)| *user)
            .collect();
        Some(GroceryList {
            id,
            name: record.name.clone(),
            owner: record.owner,
            shared_with,
            share_token: record.share_token.clone(),
            created_at: record.created_at,
        })
    }

    fn insert_items(&mut self, list: GroceryListId, items: &[NewGroceryItem]) {
        for item in items {
            let id = GroceryItemId::new(self.next_id());
            self.items.insert(
                id,
                GroceryItem {
                    id,
                    list_id: list,
                    name: item.name.clone(),
                    quantity: item.quantity,
                    price: item.price,
                    image_url: item.image_url.clone(),
                },
            );
        }
    }
}

/// Storage held in process memory.
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of membership rows for a list.
    pub async fn member_count(&self, list: GroceryListId) -> usize {
        self.tables
            .read()
            .await
            .members
            .iter()
            .filter(|(id, _)| *id == list)
            .count()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|record| record.user.username == *username)
        {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }
        let user = User {
            id: UserId::new(tables.next_id()),
            username: username.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(user)
    }

    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .get_password_hash(username)
            .await?
            .map(|(user, _)| user))
    }

    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|record| record.user.username == *username)
            .map(|record| (record.user.clone(), record.password_hash.clone())))
    }
}

#[async_trait]
impl ListStore for InMemoryStore {
    async fn create_list(
        &self,
        owner: UserId,
        name: &str,
        items: &[NewGroceryItem],
    ) -> Result<GroceryList, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&owner) {
            return Err(RepositoryError::NotFound);
        }
        let id = GroceryListId::new(tables.next_id());
        tables.lists.insert(
            id,
            ListRecord {
                name: name.to_owned(),
                owner,
                share_token: None,
                created_at: Utc::now(),
            },
        );
        tables.insert_items(id, items);
        tables.list(id).ok_or(RepositoryError::NotFound)
    }

    async fn get_list(&self, id: GroceryListId) -> Result<Option<GroceryList>, RepositoryError> {
        Ok(self.tables.read().await.list(id))
    }

    async fn get_list_by_token(
        &self,
        token: &ShareToken,
    ) -> Result<Option<GroceryList>, RepositoryError> {
        let tables = self.tables.read().await;
        let id = tables
            .lists
            .iter()
            .find(|(_, record)| record.share_token.as_ref() == Some(token))
            .map(|(id, _)| *id);
        Ok(id.and_then(|id| tables.list(id)))
    }

    async fn lists_for_user(&self, user: UserId) -> Result<Vec<GroceryList>, RepositoryError> {
        let tables = self.tables.read().await;
        let owned = tables
            .lists
            .iter()
            .filter(|(_, record)| record.owner == user)
            .map(|(id, _)| *id);
        let shared = tables
            .lists
            .iter()
            .filter(|(id, record)| {
                record.owner != user && tables.members.contains(&(**id, user))
            })
            .map(|(id, _)| *id);
        Ok(owned
            .chain(shared)
            .filter_map(|id| tables.list(id))
            .collect())
    }

    async fn update_list(
        &self,
        id: GroceryListId,
        name: Option<&str>,
        items: &[NewGroceryItem],
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let record = tables.lists.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if let Some(name) = name {
            name.clone_into(&mut record.name);
        }
        tables.items.retain(|_, item| item.list_id != id);
        tables.insert_items(id, items);
        Ok(())
    }

    async fn delete_list(&self, id: GroceryListId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.lists.remove(&id).is_none() {
            return Ok(false);
        }
        tables.items.retain(|_, item| item.list_id != id);
        tables.members.retain(|(list, _)| *list != id);
        Ok(true)
    }

    async fn set_share_token(
        &self,
        id: GroceryListId,
        token: &ShareToken,
    ) -> Result<ShareToken, RepositoryError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .lists
            .iter()
            .any(|(other, record)| *other != id && record.share_token.as_ref() == Some(token));
        let record = tables.lists.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if let Some(existing) = &record.share_token {
            return Ok(existing.clone());
        }
        if taken {
            return Err(RepositoryError::Conflict(
                "share token already exists".to_owned(),
            ));
        }
        record.share_token = Some(token.clone());
        Ok(token.clone())
    }

    async fn add_member(&self, id: GroceryListId, user: UserId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.lists.contains_key(&id) || !tables.users.contains_key(&user) {
            return Err(RepositoryError::NotFound);
        }
        Ok(tables.members.insert((id, user)))
    }
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn list_items(&self, list: GroceryListId) -> Result<Vec<GroceryItem>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .filter(|item| item.list_id == list)
            .cloned()
            .collect())
    }

    async fn get_item(&self, id: GroceryItemId) -> Result<Option<GroceryItem>, RepositoryError> {
        Ok(self.tables.read().await.items.get(&id).cloned())
    }

    async fn add_item(
        &self,
        list: GroceryListId,
        item: &NewGroceryItem,
    ) -> Result<GroceryItem, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.lists.contains_key(&list) {
            return Err(RepositoryError::NotFound);
        }
        let id = GroceryItemId::new(tables.next_id());
        let stored = GroceryItem {
            id,
            list_id: list,
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.price,
            image_url: item.image_url.clone(),
        };
        tables.items.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_item(&self, item: &GroceryItem) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .items
            .get_mut(&item.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.name.clone_from(&item.name);
        stored.quantity = item.quantity;
        stored.price = item.price;
        stored.image_url.clone_from(&item.image_url);
        Ok(())
    }

    async fn delete_item(&self, id: GroceryItemId) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.items.remove(&id).is_some())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use basket_core::{Price, Quantity};

    use super::*;

    fn new_item(name: &str) -> NewGroceryItem {
        NewGroceryItem {
            name: name.to_owned(),
            quantity: Quantity::ONE,
            price: Price::from_cents(100),
            image_url: None,
        }
    }

    async fn user(store: &InMemoryStore, name: &str) -> User {
        store
            .create_user(&Username::parse(name).unwrap(), "hash")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = InMemoryStore::new();
        user(&store, "alice").await;
        let result = store
            .create_user(&Username::parse("alice").unwrap(), "other")
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_items_come_back_in_id_order() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let list = store
            .create_list(alice.id, "weekly", &[new_item("a"), new_item("b")])
            .await
            .unwrap();
        store.add_item(list.id, &new_item("c")).await.unwrap();

        let names: Vec<String> = store
            .list_items(list.id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_update_list_renames_and_replaces_together() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let list = store
            .create_list(alice.id, "weekly", &[new_item("a"), new_item("b")])
            .await
            .unwrap();

        store
            .update_list(list.id, Some("party"), &[new_item("c")])
            .await
            .unwrap();
        let stored = store.get_list(list.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "party");
        let items = store.list_items(list.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().name, "c");

        store.update_list(list.id, None, &[]).await.unwrap();
        let stored = store.get_list(list.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "party");
        assert!(store.list_items(list.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_list_is_not_found() {
        let store = InMemoryStore::new();
        let result = store
            .update_list(GroceryListId::new(42), Some("ghost"), &[new_item("a")])
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert!(store.list_items(GroceryListId::new(42)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_list_cascades() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let list = store
            .create_list(alice.id, "weekly", &[new_item("a")])
            .await
            .unwrap();
        store.add_member(list.id, bob.id).await.unwrap();

        assert!(store.delete_list(list.id).await.unwrap());
        assert!(store.list_items(list.id).await.unwrap().is_empty());
        assert_eq!(store.member_count(list.id).await, 0);
        assert!(!store.delete_list(list.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_share_token_keeps_first() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let list = store.create_list(alice.id, "weekly", &[]).await.unwrap();
        let first = ShareToken::from_entropy(&[1; 32]);
        let second = ShareToken::from_entropy(&[2; 32]);

        assert_eq!(store.set_share_token(list.id, &first).await.unwrap(), first);
        assert_eq!(store.set_share_token(list.id, &second).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_lists_for_user_owned_then_shared() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let shared = store.create_list(alice.id, "alice's", &[]).await.unwrap();
        let owned = store.create_list(bob.id, "bob's", &[]).await.unwrap();
        store.add_member(shared.id, bob.id).await.unwrap();

        let ids: Vec<GroceryListId> = store
            .lists_for_user(bob.id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![owned.id, shared.id]);
    }
}
