//! Grocery item repository for database operations.

use sqlx::{FromRow, PgConnection, PgPool};

use basket_core::{GroceryItem, GroceryItemId, GroceryListId, NewGroceryItem, Price, Quantity};

use super::RepositoryError;

#[derive(FromRow)]
struct ItemRow {
    id: GroceryItemId,
    list_id: GroceryListId,
    name: String,
    quantity: Quantity,
    price: Price,
    image_url: Option<String>,
}

impl From<ItemRow> for GroceryItem {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            list_id: row.list_id,
            name: row.name,
            quantity: row.quantity,
            price: row.price,
            image_url: row.image_url,
        }
    }
}

/// Insert items for a list on an existing connection or transaction.
pub(super) async fn insert_items(
    conn: &mut PgConnection,
    list: GroceryListId,
    items: &[NewGroceryItem],
) -> Result<(), RepositoryError> {
    for item in items {
        sqlx::query(
            r"
            INSERT INTO basket.grocery_item (list_id, name, quantity, price, image_url)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(list)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.image_url.as_deref())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Repository for grocery item database operations.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get all items of a list in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_list(&self, list: GroceryListId) -> Result<Vec<GroceryItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT id, list_id, name, quantity, price, image_url
            FROM basket.grocery_item
            WHERE list_id = $1
            ORDER BY id
            ",
        )
        .bind(list)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(GroceryItem::from).collect())
    }

    /// Get an item by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: GroceryItemId) -> Result<Option<GroceryItem>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT id, list_id, name, quantity, price, image_url
            FROM basket.grocery_item
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(GroceryItem::from))
    }

    /// Append an item to a list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the list doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        list: GroceryListId,
        item: &NewGroceryItem,
    ) -> Result<GroceryItem, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            INSERT INTO basket.grocery_item (list_id, name, quantity, price, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, list_id, name, quantity, price, image_url
            ",
        )
        .bind(list)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(GroceryItem::from(row))
    }

    /// Overwrite an item's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, item: &GroceryItem) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE basket.grocery_item
            SET name = $2, quantity = $3, price = $4, image_url = $5
            WHERE id = $1
            ",
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.image_url.as_deref())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an item.
    ///
    /// # Returns
    ///
    /// Returns `true` if the item was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: GroceryItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM basket.grocery_item WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
