//! Dashboard and catalogue views.

use axum::{Json, extract::State};
use serde::Serialize;

use basket_core::CatalogueItem;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::services::{ListService, ListView};
use crate::state::AppState;

/// Everything the home page shows.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub user: CurrentUser,
    /// Owned lists first, then lists shared with the user.
    pub lists: Vec<ListView>,
}

/// A catalogue entry with the form field its quantity is posted under.
#[derive(Debug, Serialize)]
pub struct CatalogueEntry {
    #[serde(flatten)]
    pub item: &'static CatalogueItem,
    pub field: String,
}

/// The logged-in user's lists with totals.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Dashboard>> {
    let lists = ListService::new(state.store()).dashboard(user.id).await?;
    Ok(Json(Dashboard { user, lists }))
}

/// The catalogue lists are filled from.
pub async fn catalogue() -> Json<Vec<CatalogueEntry>> {
    Json(
        ListService::catalogue()
            .iter()
            .map(|item| CatalogueEntry {
                item,
                field: item.quantity_field(),
            })
            .collect(),
    )
}
