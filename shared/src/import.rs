//! Stock-list import
//!
//! Parses the plain-text stock lists kept in the workshop, one roll per line:
//!
//! ```text
//! 3M    3630-005 Ivory [48"]    0.5
//! Metamark    MT-643 Cardinal [48"]    10
//! ```
//!
//! Parsed lines become `store` draft rows and seed the product catalog.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CatalogCombination, DraftEntry, MovementType};
use crate::types::format_quantity;

static STOCK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\S+)\s+(\S+)\s+(.+?)\s+\[(\d+(?:\.\d+)?)"\]\s+([0-9.]+)$"#)
        .expect("stock line pattern is valid")
});

/// Location given to imported rolls
pub const IMPORT_LOCATION: &str = "Storage";

const UNKNOWN_COLOUR: &str = "Unknown Color";

/// Errors raised while reading a stock list
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StockLineError {
    #[error("Could not parse line: {0}")]
    Malformed(String),

    #[error("Invalid {field} '{value}' in line: {line}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        line: String,
    },
}

/// One roll from a stock list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockLine {
    pub brand: String,
    pub series: String,
    pub colour_number: String,
    pub colour_name: String,
    pub width: Decimal,
    pub length_yards: Decimal,
}

impl StockLine {
    /// A `store` draft row for this roll, stored on the day of the import
    pub fn to_store_entry(&self, imported_on: NaiveDate) -> DraftEntry {
        let mut entry = DraftEntry::new();
        entry.movement_type = MovementType::Store;
        entry.brand = self.brand.clone();
        entry.series = self.series.clone();
        entry.colour_number = self.colour_number.clone();
        entry.colour_name = self.colour_name.clone();
        entry.width = format_quantity(self.width);
        entry.length_yards = format_quantity(self.length_yards);
        entry.location = IMPORT_LOCATION.to_string();
        entry.notes = format!(
            "{}Imported from inventory list {}",
            MovementType::Store.note_prefix().unwrap_or(""),
            imported_on.format("%Y-%m-%d")
        );
        entry.storage_date = Some(imported_on);
        entry
    }
}

/// Result of reading a whole stock list; bad lines do not stop the import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockImport {
    pub lines: Vec<StockLine>,
    /// 1-based line number and the reason it was skipped
    pub errors: Vec<(usize, StockLineError)>,
}

fn clean_colour_name(raw: &str) -> String {
    let mut name = raw.trim().to_string();
    if name.contains("????") {
        name = UNKNOWN_COLOUR.to_string();
    }
    name.replace(" PRINTED BLACK", "").trim().to_string()
}

/// `3630-005` -> (`3630`, `005`); `SC900-861-W` -> (`SC900`, `861-W`)
fn split_product_code(code: &str) -> (String, String) {
    match code.split_once('-') {
        Some((series, number)) => (series.to_string(), number.to_string()),
        None => (code.to_string(), String::new()),
    }
}

fn parse_decimal(field: &'static str, value: &str, line: &str) -> Result<Decimal, StockLineError> {
    Decimal::from_str(value).map_err(|_| StockLineError::InvalidNumber {
        field,
        value: value.to_string(),
        line: line.to_string(),
    })
}

/// Parse one non-blank stock line
pub fn parse_stock_line(line: &str) -> Result<StockLine, StockLineError> {
    let line = line.trim();
    let caps = STOCK_LINE
        .captures(line)
        .ok_or_else(|| StockLineError::Malformed(line.to_string()))?;

    let (series, colour_number) = split_product_code(&caps[2]);
    let width = parse_decimal("width", &caps[4], line)?;
    let length_yards = parse_decimal("length", &caps[5], line)?;
    if length_yards <= Decimal::ZERO {
        return Err(StockLineError::InvalidNumber {
            field: "length",
            value: caps[5].to_string(),
            line: line.to_string(),
        });
    }

    Ok(StockLine {
        brand: caps[1].to_string(),
        series,
        colour_number,
        colour_name: clean_colour_name(&caps[3]),
        width,
        length_yards,
    })
}

/// Parse a whole stock list, skipping blank lines
pub fn parse_stock_text(text: &str) -> StockImport {
    let mut import = StockImport::default();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_stock_line(line) {
            Ok(parsed) => import.lines.push(parsed),
            Err(e) => import.errors.push((index + 1, e)),
        }
    }
    import
}

/// Unique catalog combinations; the first width seen becomes the default
pub fn derive_catalog(lines: &[StockLine]) -> Vec<CatalogCombination> {
    let mut seen = HashSet::new();
    lines
        .iter()
        .filter(|l| {
            seen.insert((
                l.brand.clone(),
                l.series.clone(),
                l.colour_number.clone(),
                l.colour_name.clone(),
            ))
        })
        .map(|l| CatalogCombination {
            brand: l.brand.clone(),
            series: l.series.clone(),
            colour_number: Some(l.colour_number.clone()).filter(|n| !n.is_empty()),
            colour_name: Some(l.colour_name.clone()).filter(|n| !n.is_empty()),
            default_width: Some(l.width),
        })
        .collect()
}
