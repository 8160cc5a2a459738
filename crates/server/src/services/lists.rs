//! List management.

use serde::Serialize;
use tracing::{info, instrument};

use basket_core::catalogue::{self, CatalogueItem};
use basket_core::input::normalize_name;
use basket_core::{
    CatalogueSelection, GroceryList, GroceryListId, ListTotals, NewGroceryItem, UserId,
    compute_totals,
};

use super::{AccessService, GroceryError};
use crate::db::Store;

/// A list together with its items and totals.
#[derive(Debug, Clone, Serialize)]
pub struct ListView {
    #[serde(flatten)]
    pub list: GroceryList,
    pub is_owner: bool,
    #[serde(flatten)]
    pub totals: ListTotals,
}

/// List management service.
pub struct ListService<'a> {
    store: &'a dyn Store,
}

impl<'a> ListService<'a> {
    /// Create a new list service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    fn access(&self) -> AccessService<'a> {
        AccessService::new(self.store)
    }

    /// Create a list filled from catalogue selections.
    ///
    /// A blank name creates nothing and returns `None`.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::Repository` if the store fails.
    #[instrument(skip(self, name, selections), fields(owner = %owner))]
    pub async fn create_list(
        &self,
        owner: UserId,
        name: &str,
        selections: &[CatalogueSelection],
    ) -> Result<Option<GroceryList>, GroceryError> {
        let Some(name) = normalize_name(Some(name)) else {
            return Ok(None);
        };

        let items = snapshots(selections);
        let list = self.store.create_list(owner, &name, &items).await?;

        info!(list_id = %list.id, items = items.len(), "List created");
        Ok(Some(list))
    }

    /// Replace every item of a list with catalogue selections.
    ///
    /// Free-form items are dropped along with catalogue ones.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::PermissionDenied` unless `user` owns the list.
    /// Returns `GroceryError::NotFound` if the list doesn't exist.
    #[instrument(skip(self, selections), fields(list_id = %list_id))]
    pub async fn replace_list_items(
        &self,
        user: UserId,
        list_id: GroceryListId,
        selections: &[CatalogueSelection],
    ) -> Result<(), GroceryError> {
        self.access().authorize_owner(user, list_id).await?;
        self.store
            .update_list(list_id, None, &snapshots(selections))
            .await
            .map_err(|e| GroceryError::or_not_found(e, "list"))
    }

    /// Rename a list when `name` is non-blank and replace its items, as one
    /// update.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::PermissionDenied` unless `user` owns the list.
    /// Returns `GroceryError::NotFound` if the list doesn't exist.
    #[instrument(skip(self, name, selections), fields(list_id = %list_id))]
    pub async fn edit_list(
        &self,
        user: UserId,
        list_id: GroceryListId,
        name: Option<&str>,
        selections: &[CatalogueSelection],
    ) -> Result<(), GroceryError> {
        self.access().authorize_owner(user, list_id).await?;

        let name = normalize_name(name);
        self.store
            .update_list(list_id, name.as_deref(), &snapshots(selections))
            .await
            .map_err(|e| GroceryError::or_not_found(e, "list"))?;

        info!(items = selections.len(), "List edited");
        Ok(())
    }

    /// Delete a list with its items and memberships.
    ///
    /// Uploaded images stay in the blob store.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::PermissionDenied` unless `user` owns the list.
    /// Returns `GroceryError::NotFound` if the list doesn't exist.
    #[instrument(skip(self), fields(list_id = %list_id))]
    pub async fn delete_list(&self, user: UserId, list_id: GroceryListId) -> Result<(), GroceryError> {
        self.access().authorize_owner(user, list_id).await?;

        if !self.store.delete_list(list_id).await? {
            return Err(GroceryError::NotFound("list"));
        }
        info!("List deleted");
        Ok(())
    }

    /// Load a list the user may view, with items and totals.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::PermissionDenied` if the user has no access.
    /// Returns `GroceryError::NotFound` if the list doesn't exist.
    pub async fn view(&self, user: UserId, list_id: GroceryListId) -> Result<ListView, GroceryError> {
        let list = self.access().authorize(user, list_id).await?;
        self.view_of(user, list).await
    }

    /// Every list the user owns, then every list shared with them.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::Repository` if the store fails.
    pub async fn dashboard(&self, user: UserId) -> Result<Vec<ListView>, GroceryError> {
        let lists = self.store.lists_for_user(user).await?;
        let mut views = Vec::with_capacity(lists.len());
        for list in lists {
            views.push(self.view_of(user, list).await?);
        }
        Ok(views)
    }

    /// The static catalogue.
    #[must_use]
    pub fn catalogue() -> &'static [CatalogueItem] {
        catalogue::catalogue()
    }

    async fn view_of(&self, user: UserId, list: GroceryList) -> Result<ListView, GroceryError> {
        let items = self.store.list_items(list.id).await?;
        Ok(ListView {
            is_owner: list.owner == user,
            totals: compute_totals(&items),
            list,
        })
    }
}

fn snapshots(selections: &[CatalogueSelection]) -> Vec<NewGroceryItem> {
    selections.iter().map(CatalogueSelection::snapshot).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::{InMemoryStore, ItemStore, ListStore, UserStore};
    use basket_core::{Price, Quantity, Username};

    async fn user(store: &InMemoryStore, name: &str) -> UserId {
        store
            .create_user(&Username::parse(name).unwrap(), "hash")
            .await
            .unwrap()
            .id
    }

    fn select(key: &str, quantity: u32) -> CatalogueSelection {
        CatalogueSelection::new(catalogue::find(key).unwrap(), Quantity::new(quantity)).unwrap()
    }

    #[tokio::test]
    async fn test_create_list_snapshots_catalogue() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let service = ListService::new(&store);

        let list = service
            .create_list(alice, "  Weekly  ", &[select("milk", 3)])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(list.name, "Weekly");

        let view = service.view(alice, list.id).await.unwrap();
        let line = view.totals.lines.first().unwrap();
        assert_eq!(line.item.name, "Milk (1L)");
        assert_eq!(line.item.quantity.get(), 3);
        assert_eq!(line.item.price, Price::parse("1.50").unwrap());
        assert_eq!(line.line_total, Decimal::new(450, 2));
        assert_eq!(view.totals.total, Decimal::new(450, 2));
        assert!(view.is_owner);
    }

    #[tokio::test]
    async fn test_blank_name_creates_nothing() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let service = ListService::new(&store);

        let created = service
            .create_list(alice, "   ", &[select("milk", 1)])
            .await
            .unwrap();
        assert!(created.is_none());
        assert!(service.dashboard(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_leaves_no_leftovers() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let service = ListService::new(&store);
        let list = service
            .create_list(alice, "Weekly", &[select("milk", 2), select("eggs", 1)])
            .await
            .unwrap()
            .unwrap();
        store
            .add_item(
                list.id,
                &NewGroceryItem {
                    name: "Cheese".to_owned(),
                    quantity: Quantity::ONE,
                    price: Price::parse("4.00").unwrap(),
                    image_url: None,
                },
            )
            .await
            .unwrap();

        service
            .replace_list_items(alice, list.id, &[select("bread", 2)])
            .await
            .unwrap();

        let view = service.view(alice, list.id).await.unwrap();
        assert_eq!(view.totals.lines.len(), 1);
        assert_eq!(view.totals.lines.first().unwrap().item.name, "Bread");
        assert_eq!(view.totals.total, Decimal::new(498, 2));
    }

    #[tokio::test]
    async fn test_edit_list_renames_and_replaces() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let service = ListService::new(&store);
        let list = service
            .create_list(alice, "Weekly", &[select("milk", 2)])
            .await
            .unwrap()
            .unwrap();

        service
            .edit_list(alice, list.id, Some("Party"), &[])
            .await
            .unwrap();
        let view = service.view(alice, list.id).await.unwrap();
        assert_eq!(view.list.name, "Party");
        assert!(view.totals.lines.is_empty());

        service
            .edit_list(alice, list.id, Some("  "), &[select("eggs", 1)])
            .await
            .unwrap();
        let view = service.view(alice, list.id).await.unwrap();
        assert_eq!(view.list.name, "Party");
        assert_eq!(view.totals.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_members_cannot_edit_or_delete() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let service = ListService::new(&store);
        let list = service
            .create_list(alice, "Weekly", &[])
            .await
            .unwrap()
            .unwrap();
        store.add_member(list.id, bob).await.unwrap();

        assert!(service.view(bob, list.id).await.is_ok());
        assert!(matches!(
            service.edit_list(bob, list.id, Some("Mine"), &[]).await,
            Err(GroceryError::PermissionDenied)
        ));
        assert!(matches!(
            service.delete_list(bob, list.id).await,
            Err(GroceryError::PermissionDenied)
        ));

        service.delete_list(alice, list.id).await.unwrap();
        assert!(matches!(
            service.view(alice, list.id).await,
            Err(GroceryError::NotFound("list"))
        ));
    }

    #[tokio::test]
    async fn test_dashboard_lists_owned_then_shared() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let service = ListService::new(&store);

        let shared = service
            .create_list(alice, "Alice's", &[])
            .await
            .unwrap()
            .unwrap();
        let own = service
            .create_list(bob, "Bob's", &[select("coffee", 1)])
            .await
            .unwrap()
            .unwrap();
        store.add_member(shared.id, bob).await.unwrap();

        let dashboard = service.dashboard(bob).await.unwrap();
        let ids: Vec<_> = dashboard.iter().map(|v| v.list.id).collect();
        assert_eq!(ids, vec![own.id, shared.id]);
        assert!(dashboard.first().unwrap().is_owner);
        assert!(!dashboard.get(1).unwrap().is_owner);
    }

    #[test]
    fn test_catalogue_is_not_empty() {
        assert!(!ListService::catalogue().is_empty());
    }
}
