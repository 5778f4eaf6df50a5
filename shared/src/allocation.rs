//! Allocation validator
//!
//! Checks a whole batch of draft rows at once so that several `use` rows
//! drawing on the same variant cannot together request more length than is
//! physically on hand. Demand is accumulated in list order and the row that
//! pushes the running total over the available supply is the one flagged,
//! which keeps the outcome deterministic for a given row order.
//!
//! A row may name its roll by colour number or by colour name; both draw on
//! the same pooled supply. A row locked to a specific unit is also limited
//! to that unit's own length.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{DraftEntry, InventoryUnit, MovementType};
use crate::types::parse_quantity;
use crate::validation::{field_issues, ValidationIssue, ValidationMessage};

/// How a variant's colour is identified
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColourKey {
    Number(String),
    /// Lowercased colour name
    Name(String),
}

/// brand | series | colour | width
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub brand: String,
    pub series: String,
    pub colour: ColourKey,
    pub width: Decimal,
}

impl VariantKey {
    /// Key for a row; colour number wins over colour name when both are set.
    /// `None` when the row lacks a usable colour or width.
    pub fn for_row(row: &DraftEntry) -> Option<Self> {
        let colour = if !row.colour_number.trim().is_empty() {
            ColourKey::Number(row.colour_number.trim().to_string())
        } else if !row.colour_name.trim().is_empty() {
            ColourKey::Name(row.colour_name.trim().to_lowercase())
        } else {
            return None;
        };
        Some(Self {
            brand: row.brand.trim().to_string(),
            series: row.series.trim().to_string(),
            colour,
            width: parse_quantity(&row.width)?.normalize(),
        })
    }

    /// Every key a unit can be found under: by number and by name
    fn for_unit(unit: &InventoryUnit) -> Vec<Self> {
        let mut colours = Vec::with_capacity(2);
        if !unit.colour_number().trim().is_empty() {
            colours.push(ColourKey::Number(unit.colour_number().trim().to_string()));
        }
        if !unit.colour_name().trim().is_empty() {
            colours.push(ColourKey::Name(unit.colour_name().trim().to_lowercase()));
        }
        colours
            .into_iter()
            .map(|colour| Self {
                brand: unit.brand.trim().to_string(),
                series: unit.series.trim().to_string(),
                colour,
                width: unit.width.normalize(),
            })
            .collect()
    }
}

/// On-hand length per variant, computed once per validation pass.
///
/// A unit is reachable under its number key and its name key. Units that
/// share any key form one pool, so rows spelling the same roll differently
/// draw on the same total.
#[derive(Debug, Clone, Default)]
pub struct SupplyIndex {
    supply: HashMap<VariantKey, Decimal>,
    pool_of: HashMap<VariantKey, usize>,
    pool_supply: HashMap<usize, Decimal>,
    units: HashMap<String, Decimal>,
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

impl SupplyIndex {
    pub fn build(inventory: &[InventoryUnit]) -> Self {
        let on_hand: Vec<&InventoryUnit> = inventory.iter().filter(|u| u.is_on_hand()).collect();
        let keys: Vec<Vec<VariantKey>> = on_hand.iter().map(|u| VariantKey::for_unit(u)).collect();

        let mut parent: Vec<usize> = (0..on_hand.len()).collect();
        let mut first_seen: HashMap<&VariantKey, usize> = HashMap::new();
        for (i, unit_keys) in keys.iter().enumerate() {
            for key in unit_keys {
                let other = *first_seen.entry(key).or_insert(i);
                let (a, b) = (find_root(&mut parent, i), find_root(&mut parent, other));
                if a != b {
                    parent[a] = b;
                }
            }
        }

        let mut index = Self::default();
        for (i, unit) in on_hand.iter().enumerate() {
            let root = find_root(&mut parent, i);
            *index.pool_supply.entry(root).or_insert(Decimal::ZERO) += unit.length_yards;
            *index.units.entry(unit.id.clone()).or_insert(Decimal::ZERO) += unit.length_yards;
            for key in &keys[i] {
                *index.supply.entry(key.clone()).or_insert(Decimal::ZERO) += unit.length_yards;
                index.pool_of.insert(key.clone(), root);
            }
        }
        index
    }

    /// Total on-hand length for a variant; `None` when no unit matches at all
    pub fn available(&self, key: &VariantKey) -> Option<Decimal> {
        self.supply.get(key).copied()
    }

    /// Pool a variant belongs to and the pool's total on-hand length
    pub fn pool(&self, key: &VariantKey) -> Option<(usize, Decimal)> {
        let pool = *self.pool_of.get(key)?;
        Some((pool, self.pool_supply.get(&pool).copied().unwrap_or_default()))
    }

    /// On-hand length of one unit; `None` when it is unknown or not in stock
    pub fn unit_length(&self, unit_id: &str) -> Option<Decimal> {
        self.units.get(unit_id).copied()
    }

    /// Convenience for the view: on-hand length for whatever the row describes
    pub fn available_for_row(&self, row: &DraftEntry) -> Option<Decimal> {
        VariantKey::for_row(row).and_then(|key| self.available(&key))
    }
}

/// Validate a batch; positions are the rows' 1-based indices in `rows`
pub fn validate_batch(rows: &[DraftEntry], inventory: &[InventoryUnit]) -> Vec<ValidationMessage> {
    validate_positioned(
        rows.iter().enumerate().map(|(i, row)| (i + 1, row)),
        inventory,
    )
}

fn add_demand<K: std::hash::Hash + Eq>(
    demand: &mut HashMap<K, Decimal>,
    key: K,
    length: Decimal,
) -> Decimal {
    let total = demand.entry(key).or_insert(Decimal::ZERO);
    *total += length;
    *total
}

/// Validate rows that carry their own positions, e.g. the complete subset
/// of a larger list.
///
/// A `use` row is checked against its own variant, against the pool of
/// every variant naming the same rolls, and against its locked unit if it
/// has one. The first limit exceeded is reported.
pub fn validate_positioned<'a, I>(rows: I, inventory: &[InventoryUnit]) -> Vec<ValidationMessage>
where
    I: IntoIterator<Item = (usize, &'a DraftEntry)>,
{
    let supply = SupplyIndex::build(inventory);
    let mut key_demand: HashMap<VariantKey, Decimal> = HashMap::new();
    let mut pool_demand: HashMap<usize, Decimal> = HashMap::new();
    let mut unit_demand: HashMap<String, Decimal> = HashMap::new();
    let mut messages = Vec::new();

    for (position, row) in rows {
        let issues = field_issues(row);
        let fields_ok = issues.is_empty();
        messages.extend(
            issues
                .into_iter()
                .map(|issue| ValidationMessage::new(position, row, issue)),
        );

        if !fields_ok || row.movement_type != MovementType::Use {
            continue;
        }
        let (Some(key), Some(length)) = (VariantKey::for_row(row), row.length()) else {
            continue;
        };

        let locked = row
            .specific_inventory_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let locked_length = match locked {
            Some(id) => match supply.unit_length(id) {
                Some(len) => Some((id, len)),
                None => {
                    messages.push(ValidationMessage::new(
                        position,
                        row,
                        ValidationIssue::NoMatchingInventory,
                    ));
                    continue;
                }
            },
            None => None,
        };

        let (Some(available), Some((pool, pool_available))) =
            (supply.available(&key), supply.pool(&key))
        else {
            messages.push(ValidationMessage::new(
                position,
                row,
                ValidationIssue::NoMatchingInventory,
            ));
            continue;
        };

        let key_total = add_demand(&mut key_demand, key, length);
        let pool_total = add_demand(&mut pool_demand, pool, length);
        let unit_total = locked_length
            .map(|(id, len)| (add_demand(&mut unit_demand, id.to_string(), length), len));

        let shortfall = if key_total > available {
            Some((key_total, available))
        } else if pool_total > pool_available {
            Some((pool_total, pool_available))
        } else {
            unit_total.filter(|(total, len)| total > len)
        };

        if let Some((requested, available)) = shortfall {
            messages.push(ValidationMessage::new(
                position,
                row,
                ValidationIssue::InsufficientInventory {
                    requested,
                    available,
                },
            ));
        }
    }

    messages
}
