//! Colour number <-> colour name cross-reference
//!
//! Built from both the live inventory and the product catalog so that typing
//! either half of a colour can infer the other within a brand and series.

use std::collections::HashMap;

use crate::models::{CatalogCombination, InventoryUnit};

/// Bidirectional colour lookup, optionally scoped to one brand + series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColourCrossReference {
    number_to_name: HashMap<String, String>,
    /// Keyed by lowercase name
    name_to_number: HashMap<String, String>,
}

impl ColourCrossReference {
    /// Build the lookup. Inventory is read first, then the catalog; later
    /// records overwrite earlier ones with the same key.
    pub fn build(
        inventory: &[InventoryUnit],
        catalog: &[CatalogCombination],
        scope: Option<(&str, &str)>,
    ) -> Self {
        let in_scope = |brand: &str, series: &str| match scope {
            Some((b, s)) => brand == b && series == s,
            None => true,
        };

        let pairs = inventory
            .iter()
            .filter(|u| in_scope(&u.brand, &u.series))
            .map(|u| (u.colour_number(), u.colour_name()))
            .chain(
                catalog
                    .iter()
                    .filter(|c| in_scope(&c.brand, &c.series))
                    .map(|c| (c.colour_number(), c.colour_name())),
            );

        let mut xref = Self::default();
        for (number, name) in pairs {
            let number = number.trim();
            let name = name.trim();
            if number.is_empty() || name.is_empty() {
                continue;
            }
            xref.number_to_name
                .insert(number.to_string(), name.to_string());
            xref.name_to_number
                .insert(name.to_lowercase(), number.to_string());
        }
        xref
    }

    /// Scope derived from a row: only when both brand and series are filled
    pub fn scope_for<'a>(brand: &'a str, series: &'a str) -> Option<(&'a str, &'a str)> {
        let brand = brand.trim();
        let series = series.trim();
        if brand.is_empty() || series.is_empty() {
            None
        } else {
            Some((brand, series))
        }
    }

    pub fn name_for(&self, colour_number: &str) -> Option<&str> {
        self.number_to_name
            .get(colour_number.trim())
            .map(String::as_str)
    }

    pub fn number_for(&self, colour_name: &str) -> Option<&str> {
        self.name_to_number
            .get(&colour_name.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.number_to_name.is_empty()
    }

    pub fn len(&self) -> usize {
        self.number_to_name.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn unit(brand: &str, series: &str, number: &str, name: &str) -> InventoryUnit {
        InventoryUnit {
            id: format!("{}-{}-{}", brand, series, number),
            brand: brand.to_string(),
            series: series.to_string(),
            colour_number: Some(number.to_string()).filter(|s| !s.is_empty()),
            colour_name: Some(name.to_string()).filter(|s| !s.is_empty()),
            width: Decimal::from(48),
            length_yards: Decimal::from(10),
            disposition: Default::default(),
            location: None,
            storage_date: None,
        }
    }

    fn combo(brand: &str, series: &str, number: &str, name: &str) -> CatalogCombination {
        CatalogCombination {
            brand: brand.to_string(),
            series: series.to_string(),
            colour_number: Some(number.to_string()),
            colour_name: Some(name.to_string()),
            default_width: None,
        }
    }

    #[test]
    fn test_empty_inputs_yield_empty_maps() {
        let xref = ColourCrossReference::build(&[], &[], None);
        assert!(xref.is_empty());
        assert_eq!(xref.name_for("807"), None);
    }

    #[test]
    fn test_lookup_both_directions() {
        let inventory = vec![unit("Acme", "SeriesX", "807", "Bright Red")];
        let xref = ColourCrossReference::build(&inventory, &[], Some(("Acme", "SeriesX")));

        assert_eq!(xref.name_for("807"), Some("Bright Red"));
        assert_eq!(xref.number_for("bright red"), Some("807"));
    }

    #[test]
    fn test_scope_excludes_other_series() {
        let inventory = vec![
            unit("Acme", "SeriesX", "807", "Bright Red"),
            unit("Acme", "SeriesY", "807", "Navy"),
        ];
        let xref = ColourCrossReference::build(&inventory, &[], Some(("Acme", "SeriesY")));
        assert_eq!(xref.name_for("807"), Some("Navy"));
        assert_eq!(xref.len(), 1);
    }

    #[test]
    fn test_catalog_overwrites_inventory() {
        let inventory = vec![unit("Acme", "SeriesX", "807", "Red")];
        let catalog = vec![combo("Acme", "SeriesX", "807", "Bright Red")];
        let xref = ColourCrossReference::build(&inventory, &catalog, None);
        assert_eq!(xref.name_for("807"), Some("Bright Red"));
    }

    #[test]
    fn test_records_missing_either_half_are_skipped() {
        let inventory = vec![unit("Acme", "SeriesX", "807", ""), unit("Acme", "SeriesX", "", "Red")];
        let xref = ColourCrossReference::build(&inventory, &[], None);
        assert!(xref.is_empty());
    }

    #[test]
    fn test_scope_requires_brand_and_series() {
        assert_eq!(ColourCrossReference::scope_for("Acme", ""), None);
        assert_eq!(
            ColourCrossReference::scope_for(" Acme ", "SeriesX"),
            Some(("Acme", "SeriesX"))
        );
    }
}
