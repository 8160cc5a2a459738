//! List authorization and share-link handling.
//!
//! Every list operation runs through [`AccessService`] first: it loads the
//! list, applies the owner/member predicates from `basket_core::access` and
//! turns failures into [`GroceryError`]s.

use rand::RngCore;
use tracing::{info, instrument};

use basket_core::access::{self, RedeemerRole};
use basket_core::{GroceryItem, GroceryItemId, GroceryList, GroceryListId, ShareToken, UserId};

use super::GroceryError;
use crate::db::{RepositoryError, Store};

/// Attempts at generating an unused token before giving up.
const TOKEN_ATTEMPTS: usize = 3;

/// Outcome of redeeming a share token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// The visitor is anonymous; log in and come back to `resume_path`.
    LoginRequired { resume_path: String },
    /// The user was added to the list's shared set.
    Joined(GroceryListId),
    /// The user was already a member.
    AlreadyMember(GroceryListId),
    /// The user owns the list; nothing changed.
    Owner(GroceryListId),
}

impl Redemption {
    /// Where to send the visitor after redemption.
    #[must_use]
    pub fn redirect_path(&self) -> String {
        match self {
            Self::LoginRequired { resume_path } => {
                format!("/login?next={}", urlencoding::encode(resume_path))
            }
            Self::Joined(id) | Self::AlreadyMember(id) | Self::Owner(id) => format!("/lists/{id}"),
        }
    }
}

/// Authorization service.
pub struct AccessService<'a> {
    store: &'a dyn Store,
}

impl<'a> AccessService<'a> {
    /// Create a new access service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Load a list the user may view and mutate.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::NotFound` if the list doesn't exist.
    /// Returns `GroceryError::PermissionDenied` if the user is neither owner nor member.
    pub async fn authorize(
        &self,
        user: UserId,
        list_id: GroceryListId,
    ) -> Result<GroceryList, GroceryError> {
        let list = self
            .store
            .get_list(list_id)
            .await?
            .ok_or(GroceryError::NotFound("list"))?;

        if !access::can_view(user, &list) {
            return Err(GroceryError::PermissionDenied);
        }
        Ok(list)
    }

    /// Load a list only its owner may act on.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::NotFound` if the list doesn't exist.
    /// Returns `GroceryError::PermissionDenied` if the user is not the owner.
    pub async fn authorize_owner(
        &self,
        user: UserId,
        list_id: GroceryListId,
    ) -> Result<GroceryList, GroceryError> {
        let list = self
            .store
            .get_list(list_id)
            .await?
            .ok_or(GroceryError::NotFound("list"))?;

        if !access::is_owner(user, &list) {
            return Err(GroceryError::PermissionDenied);
        }
        Ok(list)
    }

    /// Load an item whose parent list the user may mutate.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::NotFound` if the item or its list doesn't exist.
    /// Returns `GroceryError::PermissionDenied` if the user has no access to the list.
    pub async fn authorize_item(
        &self,
        user: UserId,
        item_id: GroceryItemId,
    ) -> Result<GroceryItem, GroceryError> {
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or(GroceryError::NotFound("item"))?;

        let list = self
            .store
            .get_list(item.list_id)
            .await?
            .ok_or(GroceryError::NotFound("list"))?;

        if !access::can_mutate(user, &list) {
            return Err(GroceryError::PermissionDenied);
        }
        Ok(item)
    }

    /// Return the list's share token, creating one on first use.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::PermissionDenied` unless `requester` owns the list.
    /// Returns `GroceryError::NotFound` if the list doesn't exist.
    #[instrument(skip(self), fields(list_id = %list_id))]
    pub async fn issue_share_token(
        &self,
        list_id: GroceryListId,
        requester: UserId,
    ) -> Result<ShareToken, GroceryError> {
        let list = self.authorize_owner(requester, list_id).await?;

        if let Some(token) = list.share_token {
            return Ok(token);
        }

        let mut last_err = None;
        for _ in 0..TOKEN_ATTEMPTS {
            let candidate = generate_token();
            match self.store.set_share_token(list_id, &candidate).await {
                Ok(stored) => {
                    info!("Share token issued");
                    return Ok(stored);
                }
                Err(RepositoryError::Conflict(msg)) => {
                    last_err = Some(RepositoryError::Conflict(msg));
                }
                Err(e) => return Err(GroceryError::or_not_found(e, "list")),
            }
        }

        Err(GroceryError::Repository(last_err.unwrap_or_else(|| {
            RepositoryError::Conflict("share token".to_owned())
        })))
    }

    /// Redeem a share token on behalf of `user`.
    ///
    /// # Errors
    ///
    /// Returns `GroceryError::NotFound` if no list carries the token, including
    /// when the token is malformed.
    #[instrument(skip(self, raw_token))]
    pub async fn redeem_share_token(
        &self,
        raw_token: &str,
        user: Option<UserId>,
    ) -> Result<Redemption, GroceryError> {
        let token = ShareToken::parse(raw_token).map_err(|_| GroceryError::NotFound("list"))?;

        let list = self
            .store
            .get_list_by_token(&token)
            .await?
            .ok_or(GroceryError::NotFound("list"))?;

        let Some(user) = user else {
            return Ok(Redemption::LoginRequired {
                resume_path: access::share_path(&token),
            });
        };

        match access::redeemer_role(user, &list) {
            RedeemerRole::Owner => Ok(Redemption::Owner(list.id)),
            RedeemerRole::Member => Ok(Redemption::AlreadyMember(list.id)),
            RedeemerRole::Outsider => {
                let added = self
                    .store
                    .add_member(list.id, user)
                    .await
                    .map_err(|e| GroceryError::or_not_found(e, "list"))?;
                if added {
                    info!(list_id = %list.id, user_id = %user, "User joined shared list");
                    Ok(Redemption::Joined(list.id))
                } else {
                    Ok(Redemption::AlreadyMember(list.id))
                }
            }
        }
    }
}

/// Generate a fresh token from 32 bytes of OS-seeded randomness.
fn generate_token() -> ShareToken {
    let mut bytes = [0u8; ShareToken::ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    ShareToken::from_entropy(&bytes)
}
