//! Scripted in-memory inventory gateway for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{CatalogCombination, Disposition, DraftEntry, InventoryUnit, MovementType};
use uuid::Uuid;
use vinyl_entry::config::{EntryConfig, SubmissionConfig};
use vinyl_entry::error::{AppError, AppResult};
use vinyl_entry::external::{InventoryGateway, SubmittedRecord};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn submission_config() -> SubmissionConfig {
    SubmissionConfig {
        success_display_delay_ms: 0,
        max_concurrent: 4,
    }
}

pub fn entry_config() -> EntryConfig {
    EntryConfig {
        append_debounce_ms: 300,
    }
}

pub fn acme_unit(id: &str, length: &str) -> InventoryUnit {
    InventoryUnit {
        id: id.to_string(),
        brand: "Acme".to_string(),
        series: "SeriesX".to_string(),
        colour_number: Some("5".to_string()),
        colour_name: Some("Bright Red".to_string()),
        width: dec("48"),
        length_yards: dec(length),
        disposition: Disposition::InStock,
        location: Some("Storage".to_string()),
        storage_date: None,
    }
}

pub fn acme_combination() -> CatalogCombination {
    CatalogCombination {
        brand: "Acme".to_string(),
        series: "SeriesX".to_string(),
        colour_number: Some("807".to_string()),
        colour_name: Some("Bright Red".to_string()),
        default_width: Some(dec("48")),
    }
}

pub fn row(movement: MovementType, length: &str) -> DraftEntry {
    let mut row = DraftEntry::new();
    row.movement_type = movement;
    row.brand = "Acme".to_string();
    row.series = "SeriesX".to_string();
    row.colour_number = "5".to_string();
    row.width = "48".to_string();
    row.length_yards = length.to_string();
    row
}

/// Gateway whose failures and latencies are chosen per row
#[derive(Default)]
pub struct ScriptedGateway {
    inventory: Mutex<Vec<InventoryUnit>>,
    catalog: Mutex<Vec<CatalogCombination>>,
    failing_rows: Mutex<HashMap<Uuid, String>>,
    row_delays: Mutex<HashMap<Uuid, Duration>>,
    fail_job_links: Mutex<bool>,
    fail_listing: Mutex<bool>,
    /// Rows in the order their submissions completed
    pub completed: Mutex<Vec<Uuid>>,
    pub job_links: Mutex<Vec<(String, Vec<String>)>>,
    pub list_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    next_record: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(inventory: Vec<InventoryUnit>, catalog: Vec<CatalogCombination>) -> Self {
        Self {
            inventory: Mutex::new(inventory),
            catalog: Mutex::new(catalog),
            ..Self::default()
        }
    }

    pub fn fail_row(self, row_id: Uuid, message: &str) -> Self {
        self.failing_rows
            .lock()
            .unwrap()
            .insert(row_id, message.to_string());
        self
    }

    pub fn delay_row(self, row_id: Uuid, millis: u64) -> Self {
        self.row_delays
            .lock()
            .unwrap()
            .insert(row_id, Duration::from_millis(millis));
        self
    }

    pub fn failing_job_links(self) -> Self {
        *self.fail_job_links.lock().unwrap() = true;
        self
    }

    pub fn failing_listing(self) -> Self {
        *self.fail_listing.lock().unwrap() = true;
        self
    }

    pub fn set_inventory(&self, inventory: Vec<InventoryUnit>) {
        *self.inventory.lock().unwrap() = inventory;
    }

    pub fn completed(&self) -> Vec<Uuid> {
        self.completed.lock().unwrap().clone()
    }

    pub fn job_links(&self) -> Vec<(String, Vec<String>)> {
        self.job_links.lock().unwrap().clone()
    }
}

#[async_trait]
impl InventoryGateway for ScriptedGateway {
    async fn list_inventory(&self) -> AppResult<Vec<InventoryUnit>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_listing.lock().unwrap() {
            return Err(AppError::ExternalService("HTTP 503: unavailable".to_string()));
        }
        Ok(self.inventory.lock().unwrap().clone())
    }

    async fn list_catalog_combinations(&self) -> AppResult<Vec<CatalogCombination>> {
        Ok(self.catalog.lock().unwrap().clone())
    }

    async fn submit_row(&self, entry: &DraftEntry) -> AppResult<SubmittedRecord> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.row_delays.lock().unwrap().get(&entry.id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.lock().unwrap().push(entry.id);

        let failure = self.failing_rows.lock().unwrap().get(&entry.id).cloned();
        match failure {
            Some(message) => Err(AppError::ExternalService(message)),
            None => Ok(SubmittedRecord {
                record_id: format!("rec-{}", self.next_record.fetch_add(1, Ordering::SeqCst) + 1),
            }),
        }
    }

    async fn update_job_links(&self, record_id: &str, job_ids: &[String]) -> AppResult<()> {
        if *self.fail_job_links.lock().unwrap() {
            return Err(AppError::ExternalService("HTTP 404: job not found".to_string()));
        }
        self.job_links
            .lock()
            .unwrap()
            .push((record_id.to_string(), job_ids.to_vec()));
        Ok(())
    }
}
