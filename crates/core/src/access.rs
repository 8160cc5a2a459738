//! Who may view or change a list.
//!
//! Ownership and sharing are two separate relations: the list's `owner`
//! column and the `shared_with` membership set. Members have the same rights
//! as the owner over items; renaming, bulk replacement, deletion and
//! share-link issuance stay with the owner.

use crate::grocery::GroceryList;
use crate::types::{ShareToken, UserId};

/// True if `user` owns the list or is in its shared set.
#[must_use]
pub fn can_view(user: UserId, list: &GroceryList) -> bool {
    is_owner(user, list) || list.shared_with.contains(&user)
}

/// True if `user` may add, edit or delete items on the list.
///
/// There is no read-only role, so this is the view predicate.
#[must_use]
pub fn can_mutate(user: UserId, list: &GroceryList) -> bool {
    can_view(user, list)
}

/// True if `user` created the list.
#[must_use]
pub fn is_owner(user: UserId, list: &GroceryList) -> bool {
    list.owner == user
}

/// How a share-link redeemer relates to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemerRole {
    /// The redeemer owns the list; nothing to record.
    Owner,
    /// The redeemer is already in the shared set.
    Member,
    /// The redeemer has no access yet and should be added.
    Outsider,
}

/// Classify a user redeeming a share link for `list`.
#[must_use]
pub fn redeemer_role(user: UserId, list: &GroceryList) -> RedeemerRole {
    if is_owner(user, list) {
        RedeemerRole::Owner
    } else if list.shared_with.contains(&user) {
        RedeemerRole::Member
    } else {
        RedeemerRole::Outsider
    }
}

/// Path of the redemption endpoint for a token, relative to the site root.
#[must_use]
pub fn share_path(token: &ShareToken) -> String {
    format!("/share/{token}")
}

/// Accept a post-login redirect target only if it stays on this site.
///
/// Returns the path for `/`-rooted relative paths and `None` for anything
/// else, including protocol-relative `//host` and `/\host` forms.
#[must_use]
pub fn safe_next_path(next: &str) -> Option<&str> {
    let next = next.trim();
    let rest = next.strip_prefix('/')?;
    if rest.starts_with('/') || rest.starts_with('\\') {
        return None;
    }
    if next.chars().any(char::is_control) {
        return None;
    }
    Some(next)
}
