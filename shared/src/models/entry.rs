//! Draft entry models for bulk stock-movement entry

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::parse_quantity;

/// Kind of stock movement recorded by a draft row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    #[default]
    Unset,
    Store,
    Use,
    Waste,
    Returned,
    Damaged,
}

/// Every note prefix the cascade knows how to rewrite
pub const NOTE_PREFIXES: [&str; 5] = ["Storage: ", "Usage: ", "Waste: ", "Return: ", "Damage: "];

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Unset => "",
            MovementType::Store => "store",
            MovementType::Use => "use",
            MovementType::Waste => "waste",
            MovementType::Returned => "returned",
            MovementType::Damaged => "damaged",
        }
    }

    /// Parse the view's string form; unknown values map to `Unset`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "store" => MovementType::Store,
            "use" => MovementType::Use,
            "waste" => MovementType::Waste,
            "returned" | "return" => MovementType::Returned,
            "damaged" | "damage" => MovementType::Damaged,
            _ => MovementType::Unset,
        }
    }

    /// Movements that consume existing stock
    pub fn is_withdrawal(&self) -> bool {
        matches!(
            self,
            MovementType::Use | MovementType::Waste | MovementType::Returned | MovementType::Damaged
        )
    }

    /// Canonical notes prefix for this movement type
    pub fn note_prefix(&self) -> Option<&'static str> {
        match self {
            MovementType::Unset => None,
            MovementType::Store => Some(NOTE_PREFIXES[0]),
            MovementType::Use => Some(NOTE_PREFIXES[1]),
            MovementType::Waste => Some(NOTE_PREFIXES[2]),
            MovementType::Returned => Some(NOTE_PREFIXES[3]),
            MovementType::Damaged => Some(NOTE_PREFIXES[4]),
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementType::Unset => write!(f, "Unset"),
            MovementType::Store => write!(f, "Store"),
            MovementType::Use => write!(f, "Use"),
            MovementType::Waste => write!(f, "Waste"),
            MovementType::Returned => write!(f, "Return"),
            MovementType::Damaged => write!(f, "Damage"),
        }
    }
}

/// Per-row submission state machine: idle -> submitting -> success | error
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

/// One in-progress, not-yet-submitted inventory movement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftEntry {
    pub id: Uuid,
    #[serde(default)]
    pub movement_type: MovementType,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub series: String,
    #[serde(default)]
    pub colour_number: String,
    #[serde(default)]
    pub colour_name: String,
    /// Width in inches, as typed
    #[serde(default)]
    pub width: String,
    /// Length in yards, as typed
    #[serde(default)]
    pub length_yards: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub linked_job_ids: Vec<String>,
    /// Locks the row to one physical inventory unit
    #[serde(default)]
    pub specific_inventory_id: Option<String>,
    /// Date a stored roll entered storage; set on imported rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_date: Option<NaiveDate>,
    #[serde(default)]
    pub submission_state: SubmissionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_error: Option<String>,
    /// Non-blocking warning on a successful row (e.g. job linking failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_warning: Option<String>,
}

impl DraftEntry {
    /// Create an empty row with a fresh id
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            movement_type: MovementType::Unset,
            brand: String::new(),
            series: String::new(),
            colour_number: String::new(),
            colour_name: String::new(),
            width: String::new(),
            length_yards: String::new(),
            location: String::new(),
            notes: String::new(),
            linked_job_ids: Vec::new(),
            specific_inventory_id: None,
            storage_date: None,
            submission_state: SubmissionState::Idle,
            submission_error: None,
            submission_warning: None,
        }
    }

    pub fn has_colour(&self) -> bool {
        !self.colour_number.trim().is_empty() || !self.colour_name.trim().is_empty()
    }

    /// Parsed length, if it is a positive number
    pub fn length(&self) -> Option<Decimal> {
        parse_quantity(&self.length_yards).filter(|l| *l > Decimal::ZERO)
    }

    /// Parsed width, if it is a number
    pub fn width_value(&self) -> Option<Decimal> {
        parse_quantity(&self.width)
    }

    /// A row is complete when every required field is set and the length is positive
    pub fn is_complete(&self) -> bool {
        self.movement_type != MovementType::Unset
            && !self.brand.trim().is_empty()
            && !self.series.trim().is_empty()
            && self.has_colour()
            && !self.width.trim().is_empty()
            && self.length().is_some()
    }

    /// Rows that have not been touched by the operator
    pub fn is_blank(&self) -> bool {
        self.movement_type == MovementType::Unset
            && self.brand.is_empty()
            && self.series.is_empty()
            && !self.has_colour()
            && self.width.is_empty()
            && self.length_yards.is_empty()
            && self.location.is_empty()
            && self.notes.is_empty()
            && self.linked_job_ids.is_empty()
    }

    /// Human-readable product label, e.g. "3M 3630 057 Olympic Blue"
    pub fn product_label(&self) -> String {
        [
            self.brand.trim(),
            self.series.trim(),
            self.colour_number.trim(),
            self.colour_name.trim(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl Default for DraftEntry {
    fn default() -> Self {
        Self::new()
    }
}

/// Focusable cells of a row, in the order the view must honour for tab/enter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FocusField {
    Type,
    Product,
    Width,
    Length,
    Location,
    Jobs,
    Notes,
}

pub const FIELD_FOCUS_ORDER: [FocusField; 7] = [
    FocusField::Type,
    FocusField::Product,
    FocusField::Width,
    FocusField::Length,
    FocusField::Location,
    FocusField::Jobs,
    FocusField::Notes,
];

impl FocusField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusField::Type => "type",
            FocusField::Product => "product",
            FocusField::Width => "width",
            FocusField::Length => "length",
            FocusField::Location => "location",
            FocusField::Jobs => "jobs",
            FocusField::Notes => "notes",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        FIELD_FOCUS_ORDER.iter().copied().find(|f| f.as_str() == value)
    }

    fn position(&self) -> usize {
        FIELD_FOCUS_ORDER
            .iter()
            .position(|f| f == self)
            .unwrap_or_default()
    }

    /// Field after this one; `None` at the end of the row
    pub fn next(&self) -> Option<Self> {
        FIELD_FOCUS_ORDER.get(self.position() + 1).copied()
    }

    /// Field before this one; `None` at the start of the row
    pub fn previous(&self) -> Option<Self> {
        self.position()
            .checked_sub(1)
            .and_then(|i| FIELD_FOCUS_ORDER.get(i).copied())
    }
}

/// Outcome of one row after submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowResult {
    pub row_id: Uuid,
    /// 1-based position of the row in the batch at submission time
    pub position: usize,
    pub state: SubmissionState,
    pub record_id: Option<String>,
    pub error: Option<String>,
    pub warning: Option<String>,
}

/// Batch-level summary returned by a submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSummary {
    pub success_count: usize,
    pub fail_count: usize,
    pub results: Vec<RowResult>,
}

impl BatchSummary {
    /// Aggregate message listing every failed row, if any failed
    pub fn failure_message(&self) -> Option<String> {
        if self.fail_count == 0 {
            return None;
        }
        let lines: Vec<String> = self
            .results
            .iter()
            .filter(|r| r.state == SubmissionState::Error)
            .map(|r| {
                format!(
                    "Row {}: {}",
                    r.position,
                    r.error.as_deref().unwrap_or("Unknown error")
                )
            })
            .collect();
        Some(format!(
            "{} of {} entries failed:\n{}",
            self.fail_count,
            self.success_count + self.fail_count,
            lines.join("\n")
        ))
    }
}
