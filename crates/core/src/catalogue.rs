//! The fixed catalogue lists are populated from.
//!
//! Catalogue entries are copied into a list when it is created or its items
//! are replaced. Items keep the name, price and image they had at that
//! moment; nothing links them back to the catalogue afterwards.

use serde::{Serialize, Serializer};

use crate::grocery::NewGroceryItem;
use crate::types::{Price, Quantity};

/// Form fields carrying a catalogue quantity are named `qty_<key>`.
pub const QUANTITY_FIELD_PREFIX: &str = "qty_";

/// One product in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogueItem {
    /// Stable slug used in form field names and seed files.
    pub key: &'static str,
    pub name: &'static str,
    #[serde(rename = "price", serialize_with = "serialize_cents")]
    pub price_cents: u32,
    pub image_url: Option<&'static str>,
}

fn serialize_cents<S: Serializer>(cents: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    Price::from_cents(*cents).serialize(serializer)
}

impl CatalogueItem {
    /// Unit price.
    #[must_use]
    pub fn price(&self) -> Price {
        Price::from_cents(self.price_cents)
    }

    /// Form field name for this entry's quantity.
    #[must_use]
    pub fn quantity_field(&self) -> String {
        format!("{QUANTITY_FIELD_PREFIX}{}", self.key)
    }

    /// Snapshot this entry as a new list item.
    #[must_use]
    pub fn snapshot(&self, quantity: Quantity) -> NewGroceryItem {
        NewGroceryItem {
            name: self.name.to_owned(),
            quantity,
            price: self.price(),
            image_url: self.image_url.map(str::to_owned),
        }
    }
}

static CATALOGUE: &[CatalogueItem] = &[
    CatalogueItem {
        key: "milk",
        name: "Milk (1L)",
        price_cents: 150,
        image_url: None,
    },
    CatalogueItem {
        key: "eggs",
        name: "Eggs (dozen)",
        price_cents: 325,
        image_url: None,
    },
    CatalogueItem {
        key: "bread",
        name: "Bread",
        price_cents: 249,
        image_url: None,
    },
    CatalogueItem {
        key: "butter",
        name: "Butter",
        price_cents: 399,
        image_url: None,
    },
    CatalogueItem {
        key: "apples",
        name: "Apples (1kg)",
        price_cents: 280,
        image_url: None,
    },
    CatalogueItem {
        key: "bananas",
        name: "Bananas (bunch)",
        price_cents: 119,
        image_url: None,
    },
    CatalogueItem {
        key: "rice",
        name: "Rice (2kg)",
        price_cents: 450,
        image_url: None,
    },
    CatalogueItem {
        key: "pasta",
        name: "Pasta (500g)",
        price_cents: 135,
        image_url: None,
    },
    CatalogueItem {
        key: "tomatoes",
        name: "Tomatoes (500g)",
        price_cents: 210,
        image_url: None,
    },
    CatalogueItem {
        key: "coffee",
        name: "Coffee (250g)",
        price_cents: 675,
        image_url: None,
    },
];

/// Every catalogue entry, in display order.
#[must_use]
pub fn catalogue() -> &'static [CatalogueItem] {
    CATALOGUE
}

/// Look up an entry by key.
#[must_use]
pub fn find(key: &str) -> Option<&'static CatalogueItem> {
    CATALOGUE.iter().find(|item| item.key == key)
}

/// A catalogue entry picked with a positive quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogueSelection {
    pub item: &'static CatalogueItem,
    pub quantity: Quantity,
}

impl CatalogueSelection {
    /// Select `item` with a raw quantity string.
    ///
    /// Unparsable, negative and zero quantities yield `None`.
    #[must_use]
    pub fn parse(item: &'static CatalogueItem, raw_quantity: &str) -> Option<Self> {
        let quantity = Quantity::parse(raw_quantity).unwrap_or(Quantity::ZERO);
        Self::new(item, quantity)
    }

    /// Select `item` with a quantity, or `None` when it is zero.
    #[must_use]
    pub const fn new(item: &'static CatalogueItem, quantity: Quantity) -> Option<Self> {
        if quantity.is_zero() {
            None
        } else {
            Some(Self { item, quantity })
        }
    }

    /// Snapshot as a new list item.
    #[must_use]
    pub fn snapshot(&self) -> NewGroceryItem {
        self.item.snapshot(self.quantity)
    }
}

/// Build selections from submitted form fields.
///
/// Fields named `qty_<key>` for a known key contribute a selection when their
/// quantity is positive; every other field is ignored. The result follows
/// catalogue order, and when a key repeats the last value wins.
pub fn selections_from_fields<'a, I>(fields: I) -> Vec<CatalogueSelection>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut quantities: Vec<Option<&str>> = vec![None; CATALOGUE.len()];
    for (name, value) in fields {
        let Some(key) = name.strip_prefix(QUANTITY_FIELD_PREFIX) else {
            continue;
        };
        if let Some(index) = CATALOGUE.iter().position(|item| item.key == key)
            && let Some(slot) = quantities.get_mut(index)
        {
            *slot = Some(value);
        }
    }

    CATALOGUE
        .iter()
        .zip(quantities)
        .filter_map(|(item, raw)| raw.and_then(|raw| CatalogueSelection::parse(item, raw)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique() {
        let mut keys: Vec<&str> = catalogue().iter().map(|i| i.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), catalogue().len());
    }

    #[test]
    fn test_snapshot_copies_price_and_quantity() {
        let milk = find("milk").unwrap();
        assert_eq!(milk.price().to_string(), "1.50");

        let selection = CatalogueSelection::parse(milk, "3").unwrap();
        let item = selection.snapshot();
        assert_eq!(item.name, milk.name);
        assert_eq!(item.quantity.get(), 3);
        assert_eq!(item.price.to_string(), "1.50");
        assert_eq!(item.price.line_total(item.quantity).to_string(), "4.50");
    }

    #[test]
    fn test_zero_negative_and_garbage_quantities_are_omitted() {
        let eggs = find("eggs").unwrap();
        assert!(CatalogueSelection::parse(eggs, "0").is_none());
        assert!(CatalogueSelection::parse(eggs, "-4").is_none());
        assert!(CatalogueSelection::parse(eggs, "lots").is_none());
        assert!(CatalogueSelection::parse(eggs, "").is_none());
    }

    #[test]
    fn test_selections_from_fields() {
        let fields = [
            ("name", "weekly"),
            ("qty_bread", "2"),
            ("qty_milk", "3"),
            ("qty_eggs", "0"),
            ("qty_unknown", "5"),
            ("qty_coffee", "abc"),
        ];
        let selections = selections_from_fields(fields);
        let picked: Vec<(&str, u32)> = selections
            .iter()
            .map(|s| (s.item.key, s.quantity.get()))
            .collect();
        assert_eq!(picked, vec![("milk", 3), ("bread", 2)]);
    }

    #[test]
    fn test_repeated_field_last_wins() {
        let selections = selections_from_fields([("qty_milk", "1"), ("qty_milk", "4")]);
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].quantity.get(), 4);
    }

    #[test]
    fn test_serializes_price_as_string() {
        let json = serde_json::to_value(find("milk").unwrap()).unwrap();
        assert_eq!(json["price"], "1.50");
        assert_eq!(json["key"], "milk");
    }
}
