//! Inventory and catalog models consumed read-only by the entry engine

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a physical unit currently stands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    #[default]
    InStock,
    Used,
    Wasted,
    Returned,
    Damaged,
}

/// One physical roll or offcut of vinyl
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryUnit {
    pub id: String,
    pub brand: String,
    pub series: String,
    pub colour_number: Option<String>,
    pub colour_name: Option<String>,
    /// Width in inches
    pub width: Decimal,
    pub length_yards: Decimal,
    #[serde(default)]
    pub disposition: Disposition,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub storage_date: Option<NaiveDate>,
}

impl InventoryUnit {
    pub fn is_on_hand(&self) -> bool {
        self.disposition == Disposition::InStock
    }

    pub fn colour_number(&self) -> &str {
        self.colour_number.as_deref().unwrap_or("")
    }

    pub fn colour_name(&self) -> &str {
        self.colour_name.as_deref().unwrap_or("")
    }
}

/// A known product variant, whether or not any is currently in stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogCombination {
    pub brand: String,
    pub series: String,
    pub colour_number: Option<String>,
    pub colour_name: Option<String>,
    pub default_width: Option<Decimal>,
}

impl CatalogCombination {
    pub fn colour_number(&self) -> &str {
        self.colour_number.as_deref().unwrap_or("")
    }

    pub fn colour_name(&self) -> &str {
        self.colour_name.as_deref().unwrap_or("")
    }
}
