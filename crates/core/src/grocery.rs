//! Grocery lists, their items and derived totals.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{GroceryItemId, GroceryListId, Price, Quantity, ShareToken, UserId};

/// A named list owned by one user and optionally shared with others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroceryList {
    pub id: GroceryListId,
    pub name: String,
    pub owner: UserId,
    /// Users who joined through the share link. May contain the owner if a
    /// row was inserted directly; access checks do not rely on its absence.
    pub shared_with: BTreeSet<UserId>,
    #[serde(skip_serializing)]
    pub share_token: Option<ShareToken>,
    pub created_at: DateTime<Utc>,
}

/// An item on a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroceryItem {
    pub id: GroceryItemId,
    pub list_id: GroceryListId,
    pub name: String,
    pub quantity: Quantity,
    pub price: Price,
    pub image_url: Option<String>,
}

impl GroceryItem {
    /// `quantity × price` for this item.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.line_total(self.quantity)
    }
}

/// Fields for an item that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroceryItem {
    pub name: String,
    pub quantity: Quantity,
    pub price: Price,
    pub image_url: Option<String>,
}

/// An item together with its line total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemLine {
    #[serde(flatten)]
    pub item: GroceryItem,
    pub line_total: Decimal,
}

/// Totals for a list, one line per item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ListTotals {
    pub lines: Vec<ItemLine>,
    pub total: Decimal,
}

/// Compute line totals and the list total.
///
/// Lines keep the order of `items`; stores hand items back in ascending id
/// order. Totals are never persisted.
#[must_use]
pub fn compute_totals(items: &[GroceryItem]) -> ListTotals {
    let lines: Vec<ItemLine> = items
        .iter()
        .map(|item| ItemLine {
            item: item.clone(),
            line_total: item.line_total(),
        })
        .collect();
    let mut total = lines
        .iter()
        .fold(Price::ZERO.amount(), |sum, line| sum + line.line_total);
    total.rescale(Price::SCALE);
    ListTotals { lines, total }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, quantity: u32, price: &str) -> GroceryItem {
        GroceryItem {
            id: GroceryItemId::new(id),
            list_id: GroceryListId::new(1),
            name: format!("item {id}"),
            quantity: Quantity::new(quantity),
            price: Price::parse(price).unwrap(),
            image_url: None,
        }
    }

    #[test]
    fn test_empty_list_totals_zero() {
        let totals = compute_totals(&[]);
        assert!(totals.lines.is_empty());
        assert_eq!(totals.total, Decimal::ZERO);
        assert_eq!(totals.total.to_string(), "0.00");
    }

    #[test]
    fn test_line_total_uses_decimal_arithmetic() {
        let totals = compute_totals(&[item(1, 3, "1.50")]);
        assert_eq!(totals.lines[0].line_total.to_string(), "4.50");
        assert_eq!(totals.total.to_string(), "4.50");
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let items = vec![item(1, 3, "0.10"), item(2, 7, "0.20"), item(3, 0, "9.99")];
        let totals = compute_totals(&items);
        let expected: Decimal = items
            .iter()
            .map(|i| Decimal::from(i.quantity.get()) * i.price.amount())
            .sum();
        assert_eq!(totals.total, expected);
        assert_eq!(totals.total.to_string(), "1.70");
    }

    #[test]
    fn test_zero_lines_keep_two_places() {
        let totals = compute_totals(&[item(1, 1, "0"), item(2, 0, "9.99")]);
        let json = serde_json::to_value(&totals).unwrap();
        assert_eq!(json["lines"][0]["line_total"], "0.00");
        assert_eq!(json["lines"][1]["line_total"], "0.00");
        assert_eq!(json["total"], "0.00");
    }

    #[test]
    fn test_lines_keep_item_order() {
        let totals = compute_totals(&[item(4, 1, "1"), item(9, 1, "1"), item(11, 1, "1")]);
        let ids: Vec<i32> = totals.lines.iter().map(|l| l.item.id.as_i32()).collect();
        assert_eq!(ids, vec![4, 9, 11]);
    }

    #[test]
    fn test_item_line_serializes_flat() {
        let totals = compute_totals(&[item(1, 2, "2.25")]);
        let json = serde_json::to_value(&totals).unwrap();
        assert_eq!(json["lines"][0]["name"], "item 1");
        assert_eq!(json["lines"][0]["line_total"], "4.50");
        assert_eq!(json["total"], "4.50");
    }
}
