//! Common types used across the entry engine

use std::str::FromStr;

use rust_decimal::Decimal;

/// Widths offered for non-withdrawal rows when nothing narrower is known
pub const DEFAULT_WIDTHS: [&str; 6] = ["15", "24", "30", "48", "54", "60"];

/// Parse a numeric-as-text quantity such as `"48"`, `" 0.5 "` or `"48\""`
pub fn parse_quantity(text: &str) -> Option<Decimal> {
    let trimmed = text.trim().trim_end_matches('"').trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// Canonical text for a quantity: `48.0` and `48` both become `"48"`
pub fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string()
}
