//! Autofill cascade
//!
//! Editing one field of a draft row may imply changes to other fields of the
//! same row. The cascade is a pure function from (row, edit) to a patch; the
//! rules run in a fixed precedence, each one seeing the row as already
//! patched by the rules before it. The cascade never touches other rows.

use serde::{Deserialize, Serialize};

use crate::colour::ColourCrossReference;
use crate::models::{CatalogCombination, DraftEntry, InventoryUnit, MovementType, NOTE_PREFIXES};
use crate::suggest::{suggest, SuggestField};
use crate::types::format_quantity;

/// Brand + series + colour picked together from the product selector
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductSelection {
    pub brand: String,
    pub series: String,
    #[serde(default)]
    pub colour_number: String,
    #[serde(default)]
    pub colour_name: String,
}

/// A single edit made by the operator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    MovementType(MovementType),
    Brand(String),
    Series(String),
    ColourNumber(String),
    ColourName(String),
    Product(ProductSelection),
    Width(String),
    Length(String),
    Location(String),
    Notes(String),
    LinkedJobs(Vec<String>),
    /// Lock the row to one physical unit, or release the lock with `None`
    SpecificInventory(Option<String>),
}

impl FieldEdit {
    /// Build an edit from the view's plain `(field, value)` pair.
    /// Product selections carry several values and go through serde instead.
    pub fn from_view(field: &str, value: &str) -> Option<Self> {
        let text = value.to_string();
        let edit = match field {
            "type" | "movement_type" => FieldEdit::MovementType(MovementType::parse(value)),
            "brand" => FieldEdit::Brand(text),
            "series" => FieldEdit::Series(text),
            "colour_number" | "color_number" => FieldEdit::ColourNumber(text),
            "colour_name" | "color_name" => FieldEdit::ColourName(text),
            "width" => FieldEdit::Width(text),
            "length" | "length_yards" => FieldEdit::Length(text),
            "location" => FieldEdit::Location(text),
            "notes" => FieldEdit::Notes(text),
            "jobs" | "linked_job_ids" => FieldEdit::LinkedJobs(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|j| !j.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            "specific_inventory_id" => {
                FieldEdit::SpecificInventory(Some(text).filter(|v| !v.trim().is_empty()))
            }
            _ => return None,
        };
        Some(edit)
    }

    fn sets_colour_number(&self) -> bool {
        match self {
            FieldEdit::ColourNumber(v) => !v.trim().is_empty(),
            FieldEdit::Product(p) => !p.colour_number.trim().is_empty(),
            _ => false,
        }
    }

    fn sets_colour_name(&self) -> bool {
        match self {
            FieldEdit::ColourName(v) => !v.trim().is_empty(),
            FieldEdit::Product(p) => !p.colour_name.trim().is_empty(),
            _ => false,
        }
    }
}

/// Read-only data the cascade may consult
#[derive(Debug, Clone, Copy)]
pub struct CascadeContext<'a> {
    pub inventory: &'a [InventoryUnit],
    pub catalog: &'a [CatalogCombination],
}

impl<'a> CascadeContext<'a> {
    pub fn new(inventory: &'a [InventoryUnit], catalog: &'a [CatalogCombination]) -> Self {
        Self { inventory, catalog }
    }
}

/// Explicit set of field changes for one row. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowPatch {
    pub movement_type: Option<MovementType>,
    pub brand: Option<String>,
    pub series: Option<String>,
    pub colour_number: Option<String>,
    pub colour_name: Option<String>,
    pub width: Option<String>,
    pub length_yards: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub linked_job_ids: Option<Vec<String>>,
    pub specific_inventory_id: Option<Option<String>>,
}

fn differs<T: PartialEq>(value: Option<T>, current: &T) -> Option<T> {
    value.filter(|v| v != current)
}

impl RowPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Immutable replacement: a new row with the patch applied
    pub fn apply(&self, row: &DraftEntry) -> DraftEntry {
        let mut next = row.clone();
        if let Some(v) = self.movement_type {
            next.movement_type = v;
        }
        if let Some(v) = &self.brand {
            next.brand = v.clone();
        }
        if let Some(v) = &self.series {
            next.series = v.clone();
        }
        if let Some(v) = &self.colour_number {
            next.colour_number = v.clone();
        }
        if let Some(v) = &self.colour_name {
            next.colour_name = v.clone();
        }
        if let Some(v) = &self.width {
            next.width = v.clone();
        }
        if let Some(v) = &self.length_yards {
            next.length_yards = v.clone();
        }
        if let Some(v) = &self.location {
            next.location = v.clone();
        }
        if let Some(v) = &self.notes {
            next.notes = v.clone();
        }
        if let Some(v) = &self.linked_job_ids {
            next.linked_job_ids = v.clone();
        }
        if let Some(v) = &self.specific_inventory_id {
            next.specific_inventory_id = v.clone();
        }
        next
    }

    /// Fold a later patch over this one; later values win
    fn merge(&mut self, later: RowPatch) {
        self.movement_type = later.movement_type.or(self.movement_type);
        self.brand = later.brand.or(self.brand.take());
        self.series = later.series.or(self.series.take());
        self.colour_number = later.colour_number.or(self.colour_number.take());
        self.colour_name = later.colour_name.or(self.colour_name.take());
        self.width = later.width.or(self.width.take());
        self.length_yards = later.length_yards.or(self.length_yards.take());
        self.location = later.location.or(self.location.take());
        self.notes = later.notes.or(self.notes.take());
        self.linked_job_ids = later.linked_job_ids.or(self.linked_job_ids.take());
        self.specific_inventory_id = later
            .specific_inventory_id
            .or(self.specific_inventory_id.take());
    }

    /// Drop entries that would not change `row`
    fn changes_against(self, row: &DraftEntry) -> RowPatch {
        RowPatch {
            movement_type: differs(self.movement_type, &row.movement_type),
            brand: differs(self.brand, &row.brand),
            series: differs(self.series, &row.series),
            colour_number: differs(self.colour_number, &row.colour_number),
            colour_name: differs(self.colour_name, &row.colour_name),
            width: differs(self.width, &row.width),
            length_yards: differs(self.length_yards, &row.length_yards),
            location: differs(self.location, &row.location),
            notes: differs(self.notes, &row.notes),
            linked_job_ids: differs(self.linked_job_ids, &row.linked_job_ids),
            specific_inventory_id: differs(self.specific_inventory_id, &row.specific_inventory_id),
        }
    }
}

/// `(before, projected, edit, ctx) -> patch over projected`
type CascadeRule = fn(&DraftEntry, &DraftEntry, &FieldEdit, &CascadeContext) -> RowPatch;

/// Rule precedence. Row-append (the fourth rule) lives with the row list,
/// see [`should_append`].
const CASCADE_RULES: [CascadeRule; 3] = [movement_type_rule, colour_cross_fill_rule, product_change_rule];

/// The field the operator touched, before any rule runs
fn direct_patch(row: &DraftEntry, edit: &FieldEdit, ctx: &CascadeContext) -> RowPatch {
    let mut patch = RowPatch::default();
    match edit {
        FieldEdit::MovementType(t) => patch.movement_type = Some(*t),
        FieldEdit::Brand(v) => patch.brand = Some(v.clone()),
        FieldEdit::Series(v) => patch.series = Some(v.clone()),
        FieldEdit::ColourNumber(v) => patch.colour_number = Some(v.clone()),
        FieldEdit::ColourName(v) => patch.colour_name = Some(v.clone()),
        FieldEdit::Product(p) => {
            patch.brand = Some(p.brand.clone());
            patch.series = Some(p.series.clone());
            patch.colour_number = Some(p.colour_number.clone());
            patch.colour_name = Some(p.colour_name.clone());
        }
        FieldEdit::Width(v) => patch.width = Some(v.clone()),
        FieldEdit::Length(v) => patch.length_yards = Some(v.clone()),
        FieldEdit::Location(v) => patch.location = Some(v.clone()),
        FieldEdit::Notes(v) => patch.notes = Some(v.clone()),
        FieldEdit::LinkedJobs(v) => patch.linked_job_ids = Some(v.clone()),
        FieldEdit::SpecificInventory(None) => patch.specific_inventory_id = Some(None),
        FieldEdit::SpecificInventory(Some(id)) => {
            // Unknown units are ignored rather than locking onto nothing
            if let Some(unit) = ctx.inventory.iter().find(|u| &u.id == id) {
                patch.specific_inventory_id = Some(Some(id.clone()));
                patch.brand = Some(unit.brand.clone());
                patch.series = Some(unit.series.clone());
                patch.colour_number = Some(unit.colour_number().to_string());
                patch.colour_name = Some(unit.colour_name().to_string());
                patch.width = Some(format_quantity(unit.width));
                if row.length_yards.trim().is_empty() {
                    patch.length_yards = Some(format_quantity(unit.length_yards));
                }
            }
        }
    }
    patch
}

/// Swap a known prefix for the new type's prefix, keeping the operator's text
fn rewrite_note_prefix(notes: &str, movement: MovementType) -> Option<String> {
    let existing = NOTE_PREFIXES.iter().find(|p| notes.starts_with(*p));
    if !notes.is_empty() && existing.is_none() {
        return None;
    }
    let rest = existing.map_or(notes, |p| &notes[p.len()..]);
    Some(format!("{}{}", movement.note_prefix().unwrap_or(""), rest))
}

/// Rule 1: movement type changed
fn movement_type_rule(
    before: &DraftEntry,
    projected: &DraftEntry,
    _edit: &FieldEdit,
    _ctx: &CascadeContext,
) -> RowPatch {
    let mut patch = RowPatch::default();
    let new_type = projected.movement_type;
    if new_type == before.movement_type {
        return patch;
    }

    if before.movement_type == MovementType::Store && new_type != MovementType::Store {
        patch.location = Some(String::new());
    }
    if new_type.is_withdrawal() {
        // Withdrawals take width/length from a specific unit or manual entry
        patch.width = Some(String::new());
        patch.length_yards = Some(String::new());
    } else if projected.specific_inventory_id.is_some() {
        patch.specific_inventory_id = Some(None);
    }
    patch.notes = rewrite_note_prefix(&projected.notes, new_type);
    patch
}

/// Rule 2: infer the other half of a colour from the cross-reference
fn colour_cross_fill_rule(
    _before: &DraftEntry,
    projected: &DraftEntry,
    edit: &FieldEdit,
    ctx: &CascadeContext,
) -> RowPatch {
    let mut patch = RowPatch::default();
    let fill_name = edit.sets_colour_number() && projected.colour_name.trim().is_empty();
    let fill_number = edit.sets_colour_name() && projected.colour_number.trim().is_empty();
    if !fill_name && !fill_number {
        return patch;
    }

    let scope = ColourCrossReference::scope_for(&projected.brand, &projected.series);
    let xref = ColourCrossReference::build(ctx.inventory, ctx.catalog, scope);
    if fill_name {
        patch.colour_name = xref.name_for(&projected.colour_number).map(str::to_string);
    } else {
        patch.colour_number = xref.number_for(&projected.colour_name).map(str::to_string);
    }
    patch
}

fn identity(row: &DraftEntry) -> [&str; 4] {
    [
        row.brand.trim(),
        row.series.trim(),
        row.colour_number.trim(),
        row.colour_name.trim(),
    ]
}

/// Rule 3: the product the row describes changed
fn product_change_rule(
    before: &DraftEntry,
    projected: &DraftEntry,
    edit: &FieldEdit,
    ctx: &CascadeContext,
) -> RowPatch {
    let mut patch = RowPatch::default();
    if matches!(edit, FieldEdit::SpecificInventory(_)) || identity(before) == identity(projected) {
        return patch;
    }

    if projected.specific_inventory_id.is_some() {
        patch.specific_inventory_id = Some(None);
    }
    if !matches!(edit, FieldEdit::Product(_)) {
        return patch;
    }

    if projected.movement_type.is_withdrawal() {
        patch.width = Some(String::new());
        patch.length_yards = Some(String::new());
    } else if projected.width.trim().is_empty() {
        let widths = suggest(SuggestField::Width, projected, ctx.inventory, ctx.catalog);
        if let [only] = widths.as_slice() {
            patch.width = Some(only.clone());
        }
    }
    patch
}

/// Compute the explicit set of field changes implied by `edit`.
///
/// The result only lists fields whose value actually changes, so applying the
/// same edit to an already-cascaded row yields an empty patch.
pub fn field_patch(row: &DraftEntry, edit: &FieldEdit, ctx: &CascadeContext) -> RowPatch {
    let mut patch = direct_patch(row, edit, ctx);
    let mut projected = patch.apply(row);
    for rule in CASCADE_RULES {
        let step = rule(row, &projected, edit, ctx);
        projected = step.apply(&projected);
        patch.merge(step);
    }
    patch.changes_against(row)
}

/// Apply an edit and its cascade, returning the new row
pub fn apply_field_edit(row: &DraftEntry, edit: &FieldEdit, ctx: &CascadeContext) -> DraftEntry {
    field_patch(row, edit, ctx).apply(row)
}

/// Rule 4: a complete last row asks for a fresh blank row below it
pub fn should_append(row: &DraftEntry, is_last: bool) -> bool {
    is_last && row.is_complete()
}
