//! Seed lists from a YAML file.
//!
//! ```yaml
//! lists:
//!   - owner: alice
//!     name: Weekly shop
//!     items:
//!       milk: 2
//!       bread: 1
//! ```
//!
//! Owners must already exist. Item keys are catalogue keys; zero quantities
//! are skipped like they are in the list form.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use basket_core::catalogue::{self, CatalogueSelection};
use basket_core::{Quantity, Username};
use basket_server::db::{PgStore, UserStore};
use basket_server::services::ListService;

use super::connect;

/// Top-level seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub lists: Vec<SeedList>,
}

/// One list to create.
#[derive(Debug, Deserialize)]
pub struct SeedList {
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
}

impl SeedList {
    /// Catalogue selections in catalogue order.
    fn selections(&self) -> Vec<CatalogueSelection> {
        catalogue::catalogue()
            .iter()
            .filter_map(|item| {
                let quantity = self.items.get(item.key)?;
                CatalogueSelection::new(item, Quantity::new(*quantity))
            })
            .collect()
    }
}

/// Check a seed file without touching the database.
fn validate(file: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    for (index, list) in file.lists.iter().enumerate() {
        if let Err(e) = Username::parse(&list.owner) {
            errors.push(format!("list {index}: invalid owner '{}': {e}", list.owner));
        }
        if list.name.trim().is_empty() {
            errors.push(format!("list {index}: name is blank"));
        }
        for key in list.items.keys() {
            if catalogue::find(key).is_none() {
                errors.push(format!("list {index}: unknown catalogue key '{key}'"));
            }
        }
    }
    errors
}

/// Create every list in `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, an owner
/// does not exist, or database operations fail.
pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %path.display(), "Loading seed file");

    let content = tokio::fs::read_to_string(path).await?;
    let file: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&file);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let store = PgStore::new(connect().await?);
    let lists = ListService::new(&store);

    let mut created = 0usize;
    for list in &file.lists {
        let username = Username::parse(&list.owner)?;
        let owner = store
            .get_user_by_username(&username)
            .await?
            .ok_or_else(|| format!("owner '{username}' does not exist"))?;

        if let Some(new_list) = lists
            .create_list(owner.id, &list.name, &list.selections())
            .await?
        {
            info!(list_id = %new_list.id, owner = %username, "Created list '{}'", new_list.name);
            created += 1;
        }
    }

    info!("Seeding complete! Lists created: {created}");
    Ok(())
}
