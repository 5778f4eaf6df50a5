//! The seam between the entry engine and whatever stores inventory records

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{CatalogCombination, DraftEntry, InventoryUnit};

use crate::error::AppResult;

/// Record created or updated for one submitted row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedRecord {
    pub record_id: String,
}

/// Inventory and persistence collaborator.
///
/// Every call is independent; the submission pipeline may issue several
/// `submit_row` calls concurrently.
#[async_trait]
pub trait InventoryGateway: Send + Sync {
    /// Every known unit, including ones no longer in stock
    async fn list_inventory(&self) -> AppResult<Vec<InventoryUnit>>;

    async fn list_catalog_combinations(&self) -> AppResult<Vec<CatalogCombination>>;

    /// Create (or, for a locked withdrawal, update) one inventory record
    async fn submit_row(&self, entry: &DraftEntry) -> AppResult<SubmittedRecord>;

    /// Best-effort association of a record with downstream jobs
    async fn update_job_links(&self, record_id: &str, job_ids: &[String]) -> AppResult<()>;
}
