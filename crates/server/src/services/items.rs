//! Free-form item management.
//!
//! Any owner or member of a list may add, edit and delete its items. Numeric
//! fields are coerced leniently (see `basket_core::input`) and a blank name
//! turns the request into a no-op.

use tracing::{info, instrument};

use basket_core::input::ItemFields;
use basket_core::{GroceryItem, GroceryItemId, GroceryListId, NewGroceryItem, UserId};

use super::{AccessService, GroceryError};
use crate::blob::{ImageUpload, ImageUploader};
use crate::db::Store;

/// Item management service.
pub struct ItemService<'a> {
    store: &'a dyn Store,
    uploader: &'a ImageUploader,
}

impl<'a> ItemService<'a> {
    /// Create a new item service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, uploader: &'a ImageUploader) -> Self {
        Self { store, uploader }
    }

    fn access(&self) -> AccessService<'a> {
        AccessService::new(self.store)
    }

    /// Append a free-form item to a list.
    ///
    /// Returns `None` without touching the store or blob store when the name
    /// is blank. A failed upload stores the item without an image.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::PermissionDenied` if the user has no access.
    /// Returns `GroceryError::NotFound` if the list doesn't exist.
    #[instrument(skip(self, submitted, image), fields(list_id = %list_id))]
    pub async fn add_free_item(
        &self,
        user: UserId,
        list_id: GroceryListId,
        submitted: &ItemFields,
        image: Option<&ImageUpload>,
    ) -> Result<Option<GroceryItem>, GroceryError> {
        self.access().authorize(user, list_id).await?;

        let Some(input) = submitted.coerce() else {
            return Ok(None);
        };

        let image_url = match image {
            Some(upload) => self.uploader.upload(upload).await,
            None => None,
        };

        let item = self
            .store
            .add_item(
                list_id,
                &NewGroceryItem {
                    name: input.name,
                    quantity: input.quantity,
                    price: input.price,
                    image_url,
                },
            )
            .await
            .map_err(|e| GroceryError::or_not_found(e, "list"))?;

        info!(item_id = %item.id, "Item added");
        Ok(Some(item))
    }

    /// Overwrite an item's fields.
    ///
    /// A new image replaces the URL only when its upload succeeds; the
    /// previous object is left in the blob store.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::PermissionDenied` if the user has no access.
    /// Returns `GroceryError::NotFound` if the item doesn't exist.
    #[instrument(skip(self, submitted, image), fields(item_id = %item_id))]
    pub async fn edit_item(
        &self,
        user: UserId,
        item_id: GroceryItemId,
        submitted: &ItemFields,
        image: Option<&ImageUpload>,
    ) -> Result<GroceryItem, GroceryError> {
        let mut item = self.access().authorize_item(user, item_id).await?;

        let Some(input) = submitted.coerce() else {
            return Ok(item);
        };

        if let Some(upload) = image
            && let Some(url) = self.uploader.upload(upload).await
        {
            item.image_url = Some(url);
        }
        item.name = input.name;
        item.quantity = input.quantity;
        item.price = input.price;

        self.store
            .update_item(&item)
            .await
            .map_err(|e| GroceryError::or_not_found(e, "item"))?;

        info!("Item updated");
        Ok(item)
    }

    /// Delete an item, returning the id of the list it belonged to.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::PermissionDenied` if the user has no access.
    /// Returns `GroceryError::NotFound` if the item doesn't exist.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn delete_item(
        &self,
        user: UserId,
        item_id: GroceryItemId,
    ) -> Result<GroceryListId, GroceryError> {
        let item = self.access().authorize_item(user, item_id).await?;

        if !self.store.delete_item(item_id).await? {
            return Err(GroceryError::NotFound("item"));
        }
        info!("Item deleted");
        Ok(item.list_id)
    }
}
