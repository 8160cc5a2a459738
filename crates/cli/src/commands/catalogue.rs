//! Catalogue listing.

use std::fmt::Write as _;

use basket_core::catalogue::catalogue;

/// Print the catalogue to stdout.
pub fn print() {
    #[allow(clippy::print_stdout)]
    {
        print!("{}", render());
    }
}

/// Render the catalogue as an aligned table.
fn render() -> String {
    let mut out = format!("{:<10} {:>8}  {}\n", "KEY", "PRICE", "NAME");
    for item in catalogue() {
        let _ = writeln!(
            out,
            "{:<10} {:>8}  {}",
            item.key,
            item.price().to_string(),
            item.name
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_has_one_row_per_entry() {
        let table = render();
        assert_eq!(table.lines().count(), catalogue().len() + 1);
        assert!(table.lines().any(|l| l.starts_with("milk") && l.contains("1.50")));
    }
}
