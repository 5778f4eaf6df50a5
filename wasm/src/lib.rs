//! WebAssembly module for the vinyl inventory entry screen
//!
//! Exposes the pure entry engine to the browser view:
//! - Contextual suggestions and the specific-unit picker
//! - The autofill cascade
//! - Batch allocation validation
//! - Field focus order
//! - Stock-list parsing
//!
//! Everything crosses the boundary as JSON strings.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::cascade::{CascadeContext, FieldEdit, RowPatch};
pub use shared::models::*;
pub use shared::suggest::SuggestField;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("vinyl entry engine loaded"));
}

fn from_json<T: DeserializeOwned>(label: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", label, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn js_err(message: String) -> JsValue {
    JsValue::from_str(&message)
}

// ============================================================================
// JSON-level implementations
// ============================================================================

fn suggest_json(
    field: &str,
    row_json: &str,
    inventory_json: &str,
    catalog_json: &str,
) -> Result<String, String> {
    let target = SuggestField::parse(field).ok_or_else(|| format!("Unknown field: {}", field))?;
    let row: DraftEntry = from_json("row", row_json)?;
    let inventory: Vec<InventoryUnit> = from_json("inventory", inventory_json)?;
    let catalog: Vec<CatalogCombination> = from_json("catalog", catalog_json)?;
    to_json(&shared::suggest::suggest(target, &row, &inventory, &catalog))
}

fn matching_units_json(row_json: &str, inventory_json: &str) -> Result<String, String> {
    let row: DraftEntry = from_json("row", row_json)?;
    let inventory: Vec<InventoryUnit> = from_json("inventory", inventory_json)?;
    to_json(&shared::suggest::matching_units(&row, &inventory))
}

fn run_edit(
    row_json: &str,
    edit_json: &str,
    inventory_json: &str,
    catalog_json: &str,
) -> Result<(DraftEntry, RowPatch), String> {
    let row: DraftEntry = from_json("row", row_json)?;
    let edit: FieldEdit = from_json("edit", edit_json)?;
    let inventory: Vec<InventoryUnit> = from_json("inventory", inventory_json)?;
    let catalog: Vec<CatalogCombination> = from_json("catalog", catalog_json)?;
    let ctx = CascadeContext::new(&inventory, &catalog);
    let patch = shared::cascade::field_patch(&row, &edit, &ctx);
    Ok((patch.apply(&row), patch))
}

fn validate_json(rows_json: &str, inventory_json: &str) -> Result<String, String> {
    let rows: Vec<DraftEntry> = from_json("rows", rows_json)?;
    let inventory: Vec<InventoryUnit> = from_json("inventory", inventory_json)?;
    // Only complete rows are checked; positions still refer to the full list
    let complete = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_complete())
        .map(|(i, r)| (i + 1, r));
    to_json(&shared::allocation::validate_positioned(complete, &inventory))
}

#[derive(Serialize)]
struct StockListJson {
    rows: Vec<DraftEntry>,
    catalog: Vec<CatalogCombination>,
    errors: Vec<StockErrorJson>,
}

#[derive(Serialize)]
struct StockErrorJson {
    line: usize,
    message: String,
}

fn stock_list_json(text: &str, imported_on: NaiveDate) -> Result<String, String> {
    let import = shared::import::parse_stock_text(text);
    to_json(&StockListJson {
        rows: import
            .lines
            .iter()
            .map(|l| l.to_store_entry(imported_on))
            .collect(),
        catalog: shared::import::derive_catalog(&import.lines),
        errors: import
            .errors
            .iter()
            .map(|(line, e)| StockErrorJson {
                line: *line,
                message: e.to_string(),
            })
            .collect(),
    })
}

// ============================================================================
// Exports
// ============================================================================

/// Ordered, unique suggestions for one field of a row
#[wasm_bindgen]
pub fn suggest_field(
    field: &str,
    row_json: &str,
    inventory_json: &str,
    catalog_json: &str,
) -> Result<String, JsValue> {
    suggest_json(field, row_json, inventory_json, catalog_json).map_err(js_err)
}

/// In-stock units a withdrawal row may lock onto, oldest first
#[wasm_bindgen]
pub fn matching_units(row_json: &str, inventory_json: &str) -> Result<String, JsValue> {
    matching_units_json(row_json, inventory_json).map_err(js_err)
}

/// Apply an edit and its cascade; returns the replacement row
#[wasm_bindgen]
pub fn apply_field_edit(
    row_json: &str,
    edit_json: &str,
    inventory_json: &str,
    catalog_json: &str,
) -> Result<String, JsValue> {
    let (row, _) = run_edit(row_json, edit_json, inventory_json, catalog_json).map_err(js_err)?;
    to_json(&row).map_err(js_err)
}

/// The explicit set of field changes an edit would make
#[wasm_bindgen]
pub fn field_patch(
    row_json: &str,
    edit_json: &str,
    inventory_json: &str,
    catalog_json: &str,
) -> Result<String, JsValue> {
    let (_, patch) =
        run_edit(row_json, edit_json, inventory_json, catalog_json).map_err(js_err)?;
    to_json(&patch).map_err(js_err)
}

/// Whether editing this row should schedule a new blank row
#[wasm_bindgen]
pub fn should_append_row(row_json: &str, is_last: bool) -> Result<bool, JsValue> {
    let row: DraftEntry = from_json("row", row_json).map_err(js_err)?;
    Ok(shared::cascade::should_append(&row, is_last))
}

/// Validation messages for the complete rows of a batch
#[wasm_bindgen]
pub fn validate_batch(rows_json: &str, inventory_json: &str) -> Result<String, JsValue> {
    validate_json(rows_json, inventory_json).map_err(js_err)
}

#[wasm_bindgen]
pub fn field_focus_order() -> js_sys::Array {
    FIELD_FOCUS_ORDER
        .iter()
        .map(|f| JsValue::from_str(f.as_str()))
        .collect()
}

#[wasm_bindgen]
pub fn next_focus_field(current: &str) -> Option<String> {
    FocusField::parse(current)?
        .next()
        .map(|f| f.as_str().to_string())
}

#[wasm_bindgen]
pub fn previous_focus_field(current: &str) -> Option<String> {
    FocusField::parse(current)?
        .previous()
        .map(|f| f.as_str().to_string())
}

#[wasm_bindgen]
pub fn default_widths() -> js_sys::Array {
    DEFAULT_WIDTHS.iter().map(|w| JsValue::from_str(w)).collect()
}

/// Browser-local calendar date
fn today() -> Result<NaiveDate, String> {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
    .ok_or_else(|| "Invalid system date".to_string())
}

/// Parse a pasted stock list into store rows, catalog entries and line errors.
/// Rows are dated today.
#[wasm_bindgen]
pub fn parse_stock_list(text: &str) -> Result<String, JsValue> {
    today()
        .and_then(|date| stock_list_json(text, date))
        .map_err(js_err)
}
