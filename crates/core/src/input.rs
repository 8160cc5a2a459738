//! Lenient parsing of submitted item fields.
//!
//! Item forms never reject numbers. A missing quantity counts as `"1"` and a
//! missing price as `"0"`; if either value then fails to parse (including
//! negative values) both fall back together to quantity 1 and price 0.00.
//! A blank name means "do nothing".

use crate::types::{Price, Quantity};

/// Raw item fields as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFields {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
}

/// Item fields after coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInput {
    pub name: String,
    pub quantity: Quantity,
    pub price: Price,
}

impl ItemFields {
    /// Coerce the raw fields, or `None` when the name is blank.
    #[must_use]
    pub fn coerce(&self) -> Option<ItemInput> {
        let name = normalize_name(self.name.as_deref())?;
        let (quantity, price) = coerce_numbers(self.quantity.as_deref(), self.price.as_deref());
        Some(ItemInput {
            name,
            quantity,
            price,
        })
    }
}

/// Trim a submitted name, treating blank or missing as `None`.
#[must_use]
pub fn normalize_name(name: Option<&str>) -> Option<String> {
    let name = name?.trim();
    (!name.is_empty()).then(|| name.to_owned())
}

/// Parse quantity and price together, defaulting both on any failure.
#[must_use]
pub fn coerce_numbers(quantity: Option<&str>, price: Option<&str>) -> (Quantity, Price) {
    let quantity = Quantity::parse(quantity.unwrap_or("1"));
    let price = Price::parse(price.unwrap_or("0"));
    match (quantity, price) {
        (Ok(quantity), Ok(price)) => (quantity, price),
        _ => (Quantity::ONE, Price::ZERO),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fields(name: &str, quantity: Option<&str>, price: Option<&str>) -> ItemFields {
        ItemFields {
            name: Some(name.to_owned()),
            quantity: quantity.map(str::to_owned),
            price: price.map(str::to_owned),
        }
    }

    #[test]
    fn test_valid_numbers_pass_through() {
        let input = fields("Cheese", Some("2"), Some("4.99")).coerce().unwrap();
        assert_eq!(input.name, "Cheese");
        assert_eq!(input.quantity.get(), 2);
        assert_eq!(input.price.to_string(), "4.99");
    }

    #[test]
    fn test_garbage_quantity_resets_both() {
        let input = fields("Cheese", Some("abc"), Some("4.99")).coerce().unwrap();
        assert_eq!(input.quantity, Quantity::ONE);
        assert_eq!(input.price, Price::ZERO);
    }

    #[test]
    fn test_garbage_price_resets_both() {
        let input = fields("Cheese", Some("7"), Some("cheap")).coerce().unwrap();
        assert_eq!(input.quantity, Quantity::ONE);
        assert_eq!(input.price, Price::ZERO);
    }

    #[test]
    fn test_negative_values_reset_both() {
        assert_eq!(
            coerce_numbers(Some("-1"), Some("2.00")),
            (Quantity::ONE, Price::ZERO)
        );
        assert_eq!(
            coerce_numbers(Some("3"), Some("-2.00")),
            (Quantity::ONE, Price::ZERO)
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        assert_eq!(coerce_numbers(None, None), (Quantity::ONE, Price::ZERO));
        let (quantity, price) = coerce_numbers(Some("5"), None);
        assert_eq!(quantity.get(), 5);
        assert_eq!(price, Price::ZERO);
    }

    #[test]
    fn test_empty_quantity_resets_both() {
        assert_eq!(
            coerce_numbers(Some(""), Some("3.00")),
            (Quantity::ONE, Price::ZERO)
        );
    }

    #[test]
    fn test_price_is_rounded() {
        let (_, price) = coerce_numbers(Some("1"), Some("2.345"));
        assert_eq!(price.to_string(), "2.35");
    }

    #[test]
    fn test_blank_name_is_none() {
        assert!(fields("   ", Some("1"), Some("1")).coerce().is_none());
        assert!(ItemFields::default().coerce().is_none());
    }

    #[test]
    fn test_name_is_trimmed() {
        assert_eq!(normalize_name(Some("  Milk ")), Some("Milk".to_owned()));
    }
}
