//! Row-level validation for draft entries
//!
//! Field checks are independent of inventory; the allocation validator
//! builds on them to produce the batch-level message list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DraftEntry, MovementType};
use crate::types::{format_quantity, parse_quantity};

/// Fields a row must carry before it can be submitted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    MovementType,
    Brand,
    Series,
    Colour,
    Width,
    Length,
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequiredField::MovementType => write!(f, "Movement type"),
            RequiredField::Brand => write!(f, "Brand"),
            RequiredField::Series => write!(f, "Series"),
            RequiredField::Colour => write!(f, "Colour number or name"),
            RequiredField::Width => write!(f, "Width"),
            RequiredField::Length => write!(f, "Length"),
        }
    }
}

/// One violated rule on one row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    MissingField { field: RequiredField },
    InvalidWidth,
    InvalidLength,
    NoMatchingInventory,
    InsufficientInventory { requested: Decimal, available: Decimal },
}

/// A validation failure tagged with the row's 1-based position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationMessage {
    pub position: usize,
    pub row_id: Uuid,
    pub issue: ValidationIssue,
    pub message: String,
}

impl ValidationMessage {
    pub fn new(position: usize, row: &DraftEntry, issue: ValidationIssue) -> Self {
        let message = describe_issue(position, row, &issue);
        Self {
            position,
            row_id: row.id,
            issue,
            message,
        }
    }
}

impl std::fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn describe_issue(position: usize, row: &DraftEntry, issue: &ValidationIssue) -> String {
    let product = format!("{} ({}\")", row.product_label(), row.width.trim());
    match issue {
        ValidationIssue::MissingField { field } => format!("Row {}: {} is required", position, field),
        ValidationIssue::InvalidWidth => format!("Row {}: Width must be a positive number", position),
        ValidationIssue::InvalidLength => format!("Row {}: Length must be a positive number", position),
        ValidationIssue::NoMatchingInventory => {
            format!("Row {}: No matching inventory for {}", position, product)
        }
        ValidationIssue::InsufficientInventory { requested, available } => format!(
            "Row {}: Insufficient inventory for {}: requested {} yd, available {} yd",
            position,
            product,
            format_quantity(*requested),
            format_quantity(*available)
        ),
    }
}

/// Validate a width cell
pub fn validate_width(width: &str) -> Result<Decimal, &'static str> {
    match parse_quantity(width) {
        Some(w) if w > Decimal::ZERO => Ok(w),
        Some(_) => Err("Width must be positive"),
        None => Err("Width must be a number"),
    }
}

/// Validate a length cell (yards)
pub fn validate_length(length: &str) -> Result<Decimal, &'static str> {
    match parse_quantity(length) {
        Some(l) if l > Decimal::ZERO => Ok(l),
        Some(_) => Err("Length must be positive"),
        None => Err("Length must be a number"),
    }
}

/// Every field-level problem on a row, in field order
pub fn field_issues(row: &DraftEntry) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut missing = |field| issues.push(ValidationIssue::MissingField { field });

    if row.movement_type == MovementType::Unset {
        missing(RequiredField::MovementType);
    }
    if row.brand.trim().is_empty() {
        missing(RequiredField::Brand);
    }
    if row.series.trim().is_empty() {
        missing(RequiredField::Series);
    }
    if !row.has_colour() {
        missing(RequiredField::Colour);
    }
    if row.width.trim().is_empty() {
        missing(RequiredField::Width);
    }
    if row.length_yards.trim().is_empty() {
        missing(RequiredField::Length);
    }

    if !row.width.trim().is_empty() && validate_width(&row.width).is_err() {
        issues.push(ValidationIssue::InvalidWidth);
    }
    if !row.length_yards.trim().is_empty() && validate_length(&row.length_yards).is_err() {
        issues.push(ValidationIssue::InvalidLength);
    }
    issues
}
