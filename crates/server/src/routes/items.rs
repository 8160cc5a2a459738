//! Item handlers.
//!
//! Item forms are `multipart/form-data` with `name`, `quantity`, `price` and
//! an optional `image` file part. An empty file part counts as no image.

use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
};

use basket_core::input::ItemFields;
use basket_core::{GroceryItemId, GroceryListId};

use super::lists::list_path;
use crate::blob::ImageUpload;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::ItemService;
use crate::state::AppState;

/// Add a free-form item to a list.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(list_id): Path<GroceryListId>,
    multipart: Multipart,
) -> Result<Redirect> {
    let (fields, image) = read_item_form(multipart).await?;
    ItemService::new(state.store(), state.uploader())
        .add_free_item(user.id, list_id, &fields, image.as_ref())
        .await?;
    Ok(Redirect::to(&list_path(list_id)))
}

/// Edit an item.
pub async fn edit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<GroceryItemId>,
    multipart: Multipart,
) -> Result<Redirect> {
    let (fields, image) = read_item_form(multipart).await?;
    let item = ItemService::new(state.store(), state.uploader())
        .edit_item(user.id, item_id, &fields, image.as_ref())
        .await?;
    Ok(Redirect::to(&list_path(item.list_id)))
}

/// Delete an item.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<GroceryItemId>,
) -> Result<Redirect> {
    let list_id = ItemService::new(state.store(), state.uploader())
        .delete_item(user.id, item_id)
        .await?;
    Ok(Redirect::to(&list_path(list_id)))
}

async fn read_item_form(mut multipart: Multipart) -> Result<(ItemFields, Option<ImageUpload>)> {
    let mut fields = ItemFields::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "name" => fields.name = Some(field.text().await?),
            "quantity" => fields.quantity = Some(field.text().await?),
            "price" => fields.price = Some(field.text().await?),
            "image" => {
                let filename = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?;
                image = (!bytes.is_empty()).then(|| ImageUpload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok((fields, image))
}
