//! Grocery list repository for database operations.
//!
//! A list row carries its owner and optional share token; the shared set is
//! aggregated from `grocery_list_member` so a list is always read whole.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use basket_core::{GroceryList, GroceryListId, NewGroceryItem, ShareToken, UserId};

use super::items::insert_items;
use super::{RepositoryError, conflict_on_unique};

/// Columns selected for every list query.
const LIST_COLUMNS: &str = r"
    l.id, l.name, l.owner_id, l.share_token, l.created_at,
    COALESCE(
        array_agg(m.user_id ORDER BY m.user_id) FILTER (WHERE m.user_id IS NOT NULL),
        '{}'
    ) AS shared_with
";

#[derive(FromRow)]
struct ListRow {
    id: GroceryListId,
    name: String,
    owner_id: UserId,
    share_token: Option<ShareToken>,
    created_at: DateTime<Utc>,
    shared_with: Vec<i32>,
}

impl From<ListRow> for GroceryList {
    fn from(row: ListRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            owner: row.owner_id,
            shared_with: row.shared_with.into_iter().map(UserId::new).collect::<BTreeSet<_>>(),
            share_token: row.share_token,
            created_at: row.created_at,
        }
    }
}

/// Repository for grocery list database operations.
pub struct ListRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ListRepository<'a> {
    /// Create a new list repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a list and its initial items in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// written in that case.
    pub async fn create(
        &self,
        owner: UserId,
        name: &str,
        items: &[NewGroceryItem],
    ) -> Result<GroceryList, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id, created_at) = sqlx::query_as::<_, (GroceryListId, DateTime<Utc>)>(
            r"
            INSERT INTO basket.grocery_list (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, created_at
            ",
        )
        .bind(name)
        .bind(owner)
        .fetch_one(&mut *tx)
        .await?;

        insert_items(&mut tx, id, items).await?;

        tx.commit().await?;

        Ok(GroceryList {
            id,
            name: name.to_owned(),
            owner,
            shared_with: BTreeSet::new(),
            share_token: None,
            created_at,
        })
    }

    /// Get a list by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: GroceryListId) -> Result<Option<GroceryList>, RepositoryError> {
        let row = sqlx::query_as::<_, ListRow>(&format!(
            r"
            SELECT {LIST_COLUMNS}
            FROM basket.grocery_list l
            LEFT JOIN basket.grocery_list_member m ON m.list_id = l.id
            WHERE l.id = $1
            GROUP BY l.id
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(GroceryList::from))
    }

    /// Get the list carrying a share token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_share_token(
        &self,
        token: &ShareToken,
    ) -> Result<Option<GroceryList>, RepositoryError> {
        let row = sqlx::query_as::<_, ListRow>(&format!(
            r"
            SELECT {LIST_COLUMNS}
            FROM basket.grocery_list l
            LEFT JOIN basket.grocery_list_member m ON m.list_id = l.id
            WHERE l.share_token = $1
            GROUP BY l.id
            "
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(GroceryList::from))
    }

    /// Lists a user owns, then lists shared with them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_user(&self, user: UserId) -> Result<Vec<GroceryList>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListRow>(&format!(
            r"
            SELECT {LIST_COLUMNS}
            FROM basket.grocery_list l
            LEFT JOIN basket.grocery_list_member m ON m.list_id = l.id
            WHERE l.owner_id = $1
               OR EXISTS (
                   SELECT 1 FROM basket.grocery_list_member x
                   WHERE x.list_id = l.id AND x.user_id = $1
               )
            GROUP BY l.id
            ORDER BY (l.owner_id <> $1), l.id
            "
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(GroceryList::from).collect())
    }

    /// Optionally rename a list and replace every item, in one transaction.
    ///
    /// The list row is locked first so a concurrent update of the same list
    /// waits instead of interleaving.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the list doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: GroceryListId,
        name: Option<&str>,
        items: &[NewGroceryItem],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, GroceryListId>(
            "SELECT id FROM basket.grocery_list WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        if let Some(name) = name {
            sqlx::query("UPDATE basket.grocery_list SET name = $2 WHERE id = $1")
                .bind(id)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM basket.grocery_item WHERE list_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_items(&mut tx, id, items).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete a list. Items and membership rows cascade.
    ///
    /// # Returns
    ///
    /// Returns `true` if the list was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: GroceryListId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM basket.grocery_list WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set the share token if the list has none, returning the stored token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another list holds `token`.
    /// Returns `RepositoryError::NotFound` if the list doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_share_token(
        &self,
        id: GroceryListId,
        token: &ShareToken,
    ) -> Result<ShareToken, RepositoryError> {
        let updated = sqlx::query_scalar::<_, ShareToken>(
            r"
            UPDATE basket.grocery_list
            SET share_token = $2
            WHERE id = $1 AND share_token IS NULL
            RETURNING share_token
            ",
        )
        .bind(id)
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "share token"))?;

        if let Some(stored) = updated {
            return Ok(stored);
        }

        // Already tokenised, possibly by a concurrent request; keep that token.
        let existing = sqlx::query_scalar::<_, Option<ShareToken>>(
            "SELECT share_token FROM basket.grocery_list WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match existing {
            None => Err(RepositoryError::NotFound),
            Some(Some(stored)) => Ok(stored),
            Some(None) => Err(RepositoryError::DataCorruption(format!(
                "share token of list {id} vanished during update"
            ))),
        }
    }

    /// Add a member to a list.
    ///
    /// # Returns
    ///
    /// Returns `true` if the membership was created, `false` if it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_member(&self, id: GroceryListId, user: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO basket.grocery_list_member (list_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (list_id, user_id) DO NOTHING
            ",
        )
        .bind(id)
        .bind(user)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
