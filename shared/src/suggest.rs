//! Contextual suggestion engine
//!
//! For a target field of a draft row, proposes the values that are legal or
//! likely given every *other* field already filled on that row. Candidates
//! come from on-hand inventory and from the product catalog, so variants with
//! no current stock are still offered where that makes sense.

use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{CatalogCombination, DraftEntry, InventoryUnit};
use crate::types::{format_quantity, parse_quantity, DEFAULT_WIDTHS};

/// Row fields the engine can propose values for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SuggestField {
    Brand,
    Series,
    ColourNumber,
    ColourName,
    Width,
    Length,
}

impl SuggestField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestField::Brand => "brand",
            SuggestField::Series => "series",
            SuggestField::ColourNumber => "colour_number",
            SuggestField::ColourName => "colour_name",
            SuggestField::Width => "width",
            SuggestField::Length => "length",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "brand" => Some(SuggestField::Brand),
            "series" => Some(SuggestField::Series),
            "colour_number" | "color_number" => Some(SuggestField::ColourNumber),
            "colour_name" | "color_name" => Some(SuggestField::ColourName),
            "width" => Some(SuggestField::Width),
            "length" | "length_yards" => Some(SuggestField::Length),
            _ => None,
        }
    }

    /// Numeric fields sort by value instead of alphabetically
    pub fn is_numeric(&self) -> bool {
        matches!(self, SuggestField::Width | SuggestField::Length)
    }
}

/// Filters derived from the filled fields of a row
#[derive(Debug, Default)]
struct Constraints<'a> {
    brand: Option<&'a str>,
    series: Option<&'a str>,
    colour_number: Option<&'a str>,
    colour_name: Option<String>,
    /// `Some(None)` means the row has a width that is not a number: nothing matches
    width: Option<Option<Decimal>>,
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl<'a> Constraints<'a> {
    /// Constraints from every filled field except `target`
    fn excluding(row: &'a DraftEntry, target: Option<SuggestField>) -> Self {
        let keep = |field: SuggestField| target != Some(field);
        Self {
            brand: non_empty(&row.brand).filter(|_| keep(SuggestField::Brand)),
            series: non_empty(&row.series).filter(|_| keep(SuggestField::Series)),
            colour_number: non_empty(&row.colour_number)
                .filter(|_| keep(SuggestField::ColourNumber)),
            colour_name: non_empty(&row.colour_name)
                .filter(|_| keep(SuggestField::ColourName))
                .map(str::to_lowercase),
            width: non_empty(&row.width)
                .filter(|_| keep(SuggestField::Width))
                .map(parse_quantity),
        }
    }

    fn matches_text(
        &self,
        brand: &str,
        series: &str,
        colour_number: &str,
        colour_name: &str,
    ) -> bool {
        self.brand.map_or(true, |b| b == brand)
            && self.series.map_or(true, |s| s == series)
            && self.colour_number.map_or(true, |n| n == colour_number)
            && self
                .colour_name
                .as_deref()
                .map_or(true, |n| colour_name.to_lowercase().contains(n))
    }

    fn matches_unit(&self, unit: &InventoryUnit) -> bool {
        let width_ok = match self.width {
            None => true,
            Some(Some(w)) => unit.width == w,
            Some(None) => false,
        };
        width_ok
            && self.matches_text(
                &unit.brand,
                &unit.series,
                unit.colour_number(),
                unit.colour_name(),
            )
    }

    fn matches_combination(&self, combo: &CatalogCombination) -> bool {
        let width_ok = match (self.width, combo.default_width) {
            (None, _) | (_, None) => true,
            (Some(Some(w)), Some(d)) => w == d,
            (Some(None), Some(_)) => false,
        };
        width_ok
            && self.matches_text(
                &combo.brand,
                &combo.series,
                combo.colour_number(),
                combo.colour_name(),
            )
    }
}

fn project_unit(target: SuggestField, unit: &InventoryUnit) -> Option<String> {
    let value = match target {
        SuggestField::Brand => unit.brand.clone(),
        SuggestField::Series => unit.series.clone(),
        SuggestField::ColourNumber => unit.colour_number().to_string(),
        SuggestField::ColourName => unit.colour_name().to_string(),
        SuggestField::Width => format_quantity(unit.width),
        SuggestField::Length => format_quantity(unit.length_yards),
    };
    non_empty(&value).map(str::to_string)
}

fn project_combination(target: SuggestField, combo: &CatalogCombination) -> Option<String> {
    let value = match target {
        SuggestField::Brand => combo.brand.clone(),
        SuggestField::Series => combo.series.clone(),
        SuggestField::ColourNumber => combo.colour_number().to_string(),
        SuggestField::ColourName => combo.colour_name().to_string(),
        SuggestField::Width => format_quantity(combo.default_width?),
        SuggestField::Length => return None,
    };
    non_empty(&value).map(str::to_string)
}

/// Deduplicate and order: numerically for width/length, alphabetically otherwise
fn sort_unique(target: SuggestField, values: Vec<String>) -> Vec<String> {
    if target.is_numeric() {
        let numbers: BTreeSet<Decimal> = values
            .iter()
            .filter_map(|v| parse_quantity(v))
            .map(|d| d.normalize())
            .collect();
        return numbers.into_iter().map(format_quantity).collect();
    }

    let unique: BTreeSet<String> = values.into_iter().collect();
    let mut sorted: Vec<String> = unique.into_iter().collect();
    sorted.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    sorted
}

/// Suggest values for `target` given the rest of `row`.
///
/// An empty result means there is no constrained suggestion and the view
/// should fall back to free text.
pub fn suggest(
    target: SuggestField,
    row: &DraftEntry,
    inventory: &[InventoryUnit],
    catalog: &[CatalogCombination],
) -> Vec<String> {
    let constraints = Constraints::excluding(row, Some(target));
    let withdrawal = row.movement_type.is_withdrawal();

    let mut values: Vec<String> = inventory
        .iter()
        .filter(|u| u.is_on_hand() && constraints.matches_unit(u))
        .filter_map(|u| project_unit(target, u))
        .collect();

    // Catalog-only variants cannot be withdrawn, so numeric fields of a
    // withdrawal row stay on-hand only.
    if !(withdrawal && target.is_numeric()) {
        values.extend(
            catalog
                .iter()
                .filter(|c| constraints.matches_combination(c))
                .filter_map(|c| project_combination(target, c)),
        );
    }

    if values.is_empty() && target == SuggestField::Width && !withdrawal {
        values = DEFAULT_WIDTHS.iter().map(|w| w.to_string()).collect();
    }

    sort_unique(target, values)
}

/// On-hand units a withdrawal row could lock onto, oldest stock first
pub fn matching_units<'a>(row: &DraftEntry, inventory: &'a [InventoryUnit]) -> Vec<&'a InventoryUnit> {
    let constraints = Constraints::excluding(row, None);
    let mut units: Vec<&InventoryUnit> = inventory
        .iter()
        .filter(|u| u.is_on_hand() && constraints.matches_unit(u))
        .collect();
    units.sort_by(|a, b| {
        match (a.storage_date, b.storage_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.id.cmp(&b.id))
    });
    units
}

/// The slice of a row that can influence suggestions for one field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SuggestionKey {
    target: SuggestField,
    withdrawal: bool,
    brand: String,
    series: String,
    colour_number: String,
    colour_name: String,
    width: String,
}

impl SuggestionKey {
    fn new(target: SuggestField, row: &DraftEntry) -> Self {
        let field = |f: SuggestField, value: &str| {
            if f == target {
                String::new()
            } else {
                value.trim().to_string()
            }
        };
        Self {
            target,
            withdrawal: row.movement_type.is_withdrawal(),
            brand: field(SuggestField::Brand, &row.brand),
            series: field(SuggestField::Series, &row.series),
            colour_number: field(SuggestField::ColourNumber, &row.colour_number),
            colour_name: field(SuggestField::ColourName, &row.colour_name),
            width: field(SuggestField::Width, &row.width),
        }
    }
}

/// Upper bound on cached results; the cache is emptied when a new key
/// would exceed it
pub const SUGGESTION_CACHE_CAPACITY: usize = 256;

/// Memoised suggestions keyed by the row fields that affect them.
///
/// Must be invalidated whenever the inventory or catalog snapshot changes.
#[derive(Debug, Default)]
pub struct SuggestionCache {
    generation: u64,
    entries: HashMap<SuggestionKey, Vec<String>>,
}

impl SuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suggest(
        &mut self,
        target: SuggestField,
        row: &DraftEntry,
        inventory: &[InventoryUnit],
        catalog: &[CatalogCombination],
    ) -> Vec<String> {
        let key = SuggestionKey::new(target, row);
        if !self.entries.contains_key(&key) && self.entries.len() >= SUGGESTION_CACHE_CAPACITY {
            self.entries.clear();
        }
        self.entries
            .entry(key)
            .or_insert_with(|| suggest(target, row, inventory, catalog))
            .clone()
    }

    /// Drop every cached result; called when the data snapshot changes
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Disposition, MovementType};
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn unit(id: &str, brand: &str, series: &str, number: &str, name: &str, width: &str, length: &str) -> InventoryUnit {
        InventoryUnit {
            id: id.to_string(),
            brand: brand.to_string(),
            series: series.to_string(),
            colour_number: Some(number.to_string()),
            colour_name: Some(name.to_string()),
            width: dec(width),
            length_yards: dec(length),
            disposition: Disposition::InStock,
            location: None,
            storage_date: None,
        }
    }

    fn sample_inventory() -> Vec<InventoryUnit> {
        vec![
            unit("1", "3M", "3630", "033", "Red", "48", "0.5"),
            unit("2", "3M", "3630", "057", "Olympic Blue", "48", "1"),
            unit("3", "3M", "3630", "097", "Bristol Blue", "24", "0.5"),
            unit("4", "Avery", "PR800", "430", "Cardinal Red", "48", "2"),
            unit("5", "Metamark", "MT", "643", "Cardinal", "48", "10"),
        ]
    }

    fn sample_catalog() -> Vec<CatalogCombination> {
        vec![CatalogCombination {
            brand: "3M".to_string(),
            series: "3630".to_string(),
            colour_number: Some("108".to_string()),
            colour_name: Some("Pink".to_string()),
            default_width: Some(dec("60")),
        }]
    }

    fn row(movement: MovementType) -> DraftEntry {
        let mut row = DraftEntry::new();
        row.movement_type = movement;
        row
    }

    // ========================================================================
    // Unit Tests
    // ========================================================================

    #[test]
    fn test_brand_suggestions_are_sorted_and_unique() {
        let result = suggest(SuggestField::Brand, &row(MovementType::Store), &sample_inventory(), &sample_catalog());
        assert_eq!(result, vec!["3M", "Avery", "Metamark"]);
    }

    #[test]
    fn test_series_narrowed_by_brand() {
        let mut r = row(MovementType::Store);
        r.brand = "3M".to_string();
        let result = suggest(SuggestField::Series, &r, &sample_inventory(), &sample_catalog());
        assert_eq!(result, vec!["3630"]);
    }

    #[test]
    fn test_colour_name_filter_is_case_insensitive_substring() {
        let mut r = row(MovementType::Store);
        r.colour_name = "blue".to_string();
        let result = suggest(SuggestField::ColourNumber, &r, &sample_inventory(), &sample_catalog());
        assert_eq!(result, vec!["057", "097"]);
    }

    #[test]
    fn test_catalog_surfaces_variants_without_stock() {
        let mut r = row(MovementType::Store);
        r.brand = "3M".to_string();
        r.series = "3630".to_string();
        let result = suggest(SuggestField::ColourName, &r, &sample_inventory(), &sample_catalog());
        assert!(result.contains(&"Pink".to_string()));
    }

    #[test]
    fn test_width_sorted_numerically() {
        let mut r = row(MovementType::Store);
        r.brand = "3M".to_string();
        let result = suggest(SuggestField::Width, &r, &sample_inventory(), &sample_catalog());
        assert_eq!(result, vec!["24", "48", "60"]);
    }

    #[test]
    fn test_withdrawal_width_excludes_catalog_only_values() {
        let mut r = row(MovementType::Use);
        r.brand = "3M".to_string();
        let result = suggest(SuggestField::Width, &r, &sample_inventory(), &sample_catalog());
        assert_eq!(result, vec!["24", "48"]);
    }

    #[test]
    fn test_width_falls_back_to_defaults_for_store() {
        let mut r = row(MovementType::Store);
        r.brand = "Unknown".to_string();
        let result = suggest(SuggestField::Width, &r, &sample_inventory(), &sample_catalog());
        assert_eq!(result, vec!["15", "24", "30", "48", "54", "60"]);
    }

    #[test]
    fn test_withdrawal_width_has_no_fallback() {
        let mut r = row(MovementType::Use);
        r.brand = "Unknown".to_string();
        assert!(suggest(SuggestField::Width, &r, &sample_inventory(), &sample_catalog()).is_empty());
    }

    #[test]
    fn test_length_has_no_fallback_and_sorts_numerically() {
        let mut r = row(MovementType::Use);
        r.width = "48".to_string();
        let result = suggest(SuggestField::Length, &r, &sample_inventory(), &sample_catalog());
        assert_eq!(result, vec!["0.5", "1", "2", "10"]);

        r.brand = "Unknown".to_string();
        assert!(suggest(SuggestField::Length, &r, &sample_inventory(), &sample_catalog()).is_empty());
    }

    #[test]
    fn test_width_constraint_compares_numerically() {
        let mut r = row(MovementType::Use);
        r.width = "48.0".to_string();
        let result = suggest(SuggestField::Brand, &r, &sample_inventory(), &[]);
        assert_eq!(result, vec!["3M", "Avery", "Metamark"]);
    }

    #[test]
    fn test_unparseable_width_matches_nothing() {
        let mut r = row(MovementType::Use);
        r.width = "wide".to_string();
        assert!(suggest(SuggestField::Brand, &r, &sample_inventory(), &[]).is_empty());
    }

    #[test]
    fn test_out_of_stock_units_are_ignored() {
        let mut inventory = sample_inventory();
        for u in inventory.iter_mut() {
            if u.brand == "Metamark" {
                u.disposition = Disposition::Used;
            }
        }
        let result = suggest(SuggestField::Brand, &row(MovementType::Use), &inventory, &[]);
        assert_eq!(result, vec!["3M", "Avery"]);
    }

    #[test]
    fn test_matching_units_oldest_first() {
        let mut inventory = sample_inventory();
        inventory[0].storage_date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1);
        inventory[1].storage_date = chrono::NaiveDate::from_ymd_opt(2023, 1, 1);
        let mut r = row(MovementType::Use);
        r.brand = "3M".to_string();
        r.width = "48".to_string();
        let ids: Vec<&str> = matching_units(&r, &inventory).iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_cache_reuses_and_invalidates() {
        let inventory = sample_inventory();
        let mut cache = SuggestionCache::new();
        let mut r = row(MovementType::Store);
        r.brand = "3M".to_string();

        let first = cache.suggest(SuggestField::Series, &r, &inventory, &[]);
        // Editing the target field itself does not change the key
        r.series = "36".to_string();
        let second = cache.suggest(SuggestField::Series, &r, &inventory, &[]);
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);

        cache.invalidate();
        assert!(cache.is_empty());
        assert_eq!(cache.generation(), 1);
    }

    #[test]
    fn test_cache_size_is_bounded() {
        let inventory = vec![unit("u1", "3M", "3630", "005", "Ivory", "48", "1")];
        let mut cache = SuggestionCache::new();
        let mut r = row(MovementType::Store);

        for i in 0..SUGGESTION_CACHE_CAPACITY + 10 {
            r.brand = format!("brand-{}", i);
            cache.suggest(SuggestField::Series, &r, &inventory, &[]);
            assert!(cache.len() <= SUGGESTION_CACHE_CAPACITY);
        }
        assert_eq!(cache.len(), 10);
        assert_eq!(cache.generation(), 0);

        // A key already cached never triggers a flush
        let cached = cache.len();
        cache.suggest(SuggestField::Series, &r, &inventory, &[]);
        assert_eq!(cache.len(), cached);
    }

    // ========================================================================
    // Property Tests
    // ========================================================================

    fn unit_strategy() -> impl Strategy<Value = InventoryUnit> {
        (
            prop::sample::select(vec!["3M", "Avery", "Metamark", "Oracal"]),
            prop::sample::select(vec!["3630", "PR800", "MT", "651"]),
            prop::sample::select(vec!["005", "033", "108", "807"]),
            prop::sample::select(vec!["Ivory", "Red", "Pink", "Bright Red"]),
            prop::sample::select(vec!["15", "24", "48", "48.0", "60"]),
            1u32..200,
        )
            .prop_map(|(brand, series, number, name, width, tenths)| InventoryUnit {
                id: format!("{}-{}-{}", brand, number, tenths),
                brand: brand.to_string(),
                series: series.to_string(),
                colour_number: Some(number.to_string()),
                colour_name: Some(name.to_string()),
                width: dec(width),
                length_yards: Decimal::new(tenths as i64, 1),
                disposition: Disposition::InStock,
                location: None,
                storage_date: None,
            })
    }

    fn field_strategy() -> impl Strategy<Value = SuggestField> {
        prop::sample::select(vec![
            SuggestField::Brand,
            SuggestField::Series,
            SuggestField::ColourNumber,
            SuggestField::ColourName,
            SuggestField::Width,
            SuggestField::Length,
        ])
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Suggestions never contain duplicates and follow the field's sort rule
        #[test]
        fn prop_suggestions_unique_and_sorted(
            inventory in prop::collection::vec(unit_strategy(), 0..30),
            target in field_strategy(),
            brand in prop::sample::select(vec!["", "3M", "Avery"]),
            withdrawal in any::<bool>(),
        ) {
            let mut r = row(if withdrawal { MovementType::Use } else { MovementType::Store });
            r.brand = brand.to_string();
            let result = suggest(target, &r, &inventory, &[]);

            let unique: BTreeSet<&String> = result.iter().collect();
            prop_assert_eq!(unique.len(), result.len());

            if target.is_numeric() {
                let numbers: Vec<Decimal> = result.iter().map(|v| dec(v)).collect();
                prop_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
            } else {
                prop_assert!(result
                    .windows(2)
                    .all(|w| w[0].to_lowercase() <= w[1].to_lowercase()));
            }
        }

        /// The cache returns exactly what a direct computation returns
        #[test]
        fn prop_cache_matches_direct(
            inventory in prop::collection::vec(unit_strategy(), 0..20),
            target in field_strategy(),
        ) {
            let mut cache = SuggestionCache::new();
            let r = row(MovementType::Store);
            prop_assert_eq!(
                cache.suggest(target, &r, &inventory, &[]),
                suggest(target, &r, &inventory, &[])
            );
        }
    }
}
