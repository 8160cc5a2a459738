//! List handlers.
//!
//! List forms post the list name plus one `qty_<key>` field per catalogue
//! entry; fields are read as raw pairs so unknown keys are simply ignored.

use axum::{
    Form, Json,
    extract::{Path, State},
    response::Redirect,
};
use serde::Serialize;

use basket_core::access::share_path;
use basket_core::catalogue::selections_from_fields;
use basket_core::{CatalogueSelection, GroceryListId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::{AccessService, ListService, ListView};
use crate::state::AppState;

/// Raw `application/x-www-form-urlencoded` pairs.
type FormPairs = Vec<(String, String)>;

/// A list's share link.
#[derive(Debug, Serialize)]
pub struct ShareLink {
    pub token: String,
    pub url: String,
}

/// Create a list from a name and catalogue quantities.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(pairs): Form<FormPairs>,
) -> Result<Redirect> {
    let name = field(&pairs, "name").unwrap_or_default();
    let created = ListService::new(state.store())
        .create_list(user.id, name, &selections(&pairs))
        .await?;

    Ok(match created {
        Some(list) => Redirect::to(&list_path(list.id)),
        None => Redirect::to("/"),
    })
}

/// A list with its items and totals.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(list_id): Path<GroceryListId>,
) -> Result<Json<ListView>> {
    let view = ListService::new(state.store()).view(user.id, list_id).await?;
    Ok(Json(view))
}

/// Rename a list and replace its items with catalogue quantities.
pub async fn edit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(list_id): Path<GroceryListId>,
    Form(pairs): Form<FormPairs>,
) -> Result<Redirect> {
    ListService::new(state.store())
        .edit_list(user.id, list_id, field(&pairs, "name"), &selections(&pairs))
        .await?;
    Ok(Redirect::to(&list_path(list_id)))
}

/// Delete a list.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(list_id): Path<GroceryListId>,
) -> Result<Redirect> {
    ListService::new(state.store())
        .delete_list(user.id, list_id)
        .await?;
    Ok(Redirect::to("/"))
}

/// Issue (or return) the list's share link.
pub async fn share(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(list_id): Path<GroceryListId>,
) -> Result<Json<ShareLink>> {
    let token = AccessService::new(state.store())
        .issue_share_token(list_id, user.id)
        .await?;

    Ok(Json(ShareLink {
        url: state.config().absolute_url(&share_path(&token)),
        token: token.as_str().to_owned(),
    }))
}

pub(super) fn list_path(list_id: GroceryListId) -> String {
    format!("/lists/{list_id}")
}

/// Last value submitted under `name`.
fn field<'a>(pairs: &'a FormPairs, name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn selections(pairs: &FormPairs) -> Vec<CatalogueSelection> {
    selections_from_fields(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> FormPairs {
        raw.iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_field_takes_last_value() {
        let form = pairs(&[("name", "first"), ("qty_milk", "2"), ("name", "second")]);
        assert_eq!(field(&form, "name"), Some("second"));
        assert_eq!(field(&form, "missing"), None);
    }

    #[test]
    fn test_selections_ignore_unknown_and_zero() {
        let form = pairs(&[
            ("name", "Weekly"),
            ("qty_milk", "2"),
            ("qty_eggs", "0"),
            ("qty_caviar", "5"),
            ("qty_bread", "lots"),
        ]);
        let picked = selections(&form);
        assert_eq!(picked.len(), 1);
        assert!(picked.iter().all(|s| s.item.key == "milk" && s.quantity.get() == 2));
    }
}
