//! HTTP client for the shop's vinyl inventory API
//!
//! Provides:
//! - Inventory and product listings for the suggestion engine
//! - Record creation for store/withdrawal rows
//! - Withdrawal against a specific, locked unit
//! - Job link updates

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{CatalogCombination, Disposition, DraftEntry, InventoryUnit};
use shared::types::parse_quantity;

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::external::gateway::{InventoryGateway, SubmittedRecord};

/// Inventory API client
#[derive(Clone)]
pub struct InventoryApiClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

// ============================================================================
// Wire types
// ============================================================================

/// Identifiers arrive as numbers from older deployments and strings from newer
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiId {
    Number(i64),
    Text(String),
}

impl ApiId {
    fn into_string(self) -> String {
        match self {
            ApiId::Number(n) => n.to_string(),
            ApiId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiVinylItem {
    id: ApiId,
    brand: String,
    series: String,
    #[serde(default)]
    colour_number: Option<String>,
    #[serde(default)]
    colour_name: Option<String>,
    /// Combined "057 Olympic Blue" form used by imported records
    #[serde(default)]
    colour: Option<String>,
    width: Decimal,
    length_yards: Decimal,
    #[serde(default)]
    disposition: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    storage_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct ApiProduct {
    brand: String,
    series: String,
    #[serde(default)]
    colour_number: Option<String>,
    #[serde(default)]
    colour_name: Option<String>,
    #[serde(default)]
    default_width: Option<Decimal>,
}

/// Listings come back either bare or wrapped in `{ "data": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiList<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ApiList<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ApiList::Bare(items) | ApiList::Wrapped { data: items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiCreated {
    Bare { id: ApiId },
    Wrapped { data: CreatedId },
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    id: ApiId,
}

impl ApiCreated {
    fn into_id(self) -> String {
        match self {
            ApiCreated::Bare { id } | ApiCreated::Wrapped { data: CreatedId { id } } => {
                id.into_string()
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct NewVinylRecord<'a> {
    #[serde(rename = "type")]
    movement_type: &'a str,
    brand: &'a str,
    series: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    colour_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    colour_name: Option<&'a str>,
    width: Decimal,
    length_yards: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_date: Option<NaiveDate>,
    notes: &'a str,
    #[serde(skip_serializing_if = "no_jobs")]
    job_ids: &'a [String],
}

fn no_jobs(jobs: &&[String]) -> bool {
    jobs.is_empty()
}

#[derive(Debug, Serialize)]
struct UnitWithdrawal<'a> {
    #[serde(rename = "type")]
    movement_type: &'a str,
    length_yards: Decimal,
    notes: &'a str,
}

#[derive(Debug, Serialize)]
struct JobLinks<'a> {
    job_ids: &'a [String],
}

// ============================================================================
// Conversions
// ============================================================================

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// `"057 Olympic Blue"` -> (`057`, `Olympic Blue`); a leading token only
/// counts as a number when it contains a digit
pub fn split_colour(colour: &str) -> (Option<String>, Option<String>) {
    let colour = colour.trim();
    if colour.is_empty() {
        return (None, None);
    }
    match colour.split_once(' ') {
        Some((head, rest)) if head.chars().any(|c| c.is_ascii_digit()) => {
            (Some(head.to_string()), non_empty(rest).map(str::to_string))
        }
        None if colour.chars().any(|c| c.is_ascii_digit()) => (Some(colour.to_string()), None),
        _ => (None, Some(colour.to_string())),
    }
}

fn parse_disposition(value: Option<&str>) -> Disposition {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        Some("used") | Some("use") => Disposition::Used,
        Some("wasted") | Some("waste") => Disposition::Wasted,
        Some("returned") | Some("return") => Disposition::Returned,
        Some("damaged") | Some("damage") => Disposition::Damaged,
        _ => Disposition::InStock,
    }
}

impl From<ApiVinylItem> for InventoryUnit {
    fn from(item: ApiVinylItem) -> Self {
        let (split_number, split_name) = item.colour.as_deref().map(split_colour).unwrap_or_default();
        InventoryUnit {
            id: item.id.into_string(),
            brand: item.brand,
            series: item.series,
            colour_number: item.colour_number.filter(|n| !n.trim().is_empty()).or(split_number),
            colour_name: item.colour_name.filter(|n| !n.trim().is_empty()).or(split_name),
            width: item.width,
            length_yards: item.length_yards,
            disposition: parse_disposition(item.disposition.as_deref()),
            location: item.location,
            storage_date: item.storage_date,
        }
    }
}

impl From<ApiProduct> for CatalogCombination {
    fn from(product: ApiProduct) -> Self {
        CatalogCombination {
            brand: product.brand,
            series: product.series,
            colour_number: product.colour_number.filter(|n| !n.trim().is_empty()),
            colour_name: product.colour_name.filter(|n| !n.trim().is_empty()),
            default_width: product.default_width,
        }
    }
}

fn quantities(entry: &DraftEntry) -> AppResult<(Decimal, Decimal)> {
    let width = parse_quantity(&entry.width).ok_or_else(|| AppError::Validation {
        field: "width".to_string(),
        message: format!("Width '{}' is not a number", entry.width),
    })?;
    let length = entry.length().ok_or_else(|| AppError::Validation {
        field: "length_yards".to_string(),
        message: "Length must be a positive number".to_string(),
    })?;
    Ok((width, length))
}

// ============================================================================
// Client
// ============================================================================

impl InventoryApiClient {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    /// Create a client with custom base URL and no authentication (for testing)
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            auth_token: None,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Request error: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(response)
    }

    async fn get_list<T: serde::de::DeserializeOwned>(&self, path: &str) -> AppResult<Vec<T>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.send(self.client.get(&url)).await?;
        let list: ApiList<T> = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse {} response: {}", path, e))
        })?;
        Ok(list.into_vec())
    }

    async fn created_id(response: Response) -> AppResult<String> {
        let created: ApiCreated = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse created record: {}", e))
        })?;
        Ok(created.into_id())
    }
}

#[async_trait]
impl InventoryGateway for InventoryApiClient {
    async fn list_inventory(&self) -> AppResult<Vec<InventoryUnit>> {
        let items: Vec<ApiVinylItem> = self.get_list("/vinyl").await?;
        Ok(items.into_iter().map(InventoryUnit::from).collect())
    }

    async fn list_catalog_combinations(&self) -> AppResult<Vec<CatalogCombination>> {
        let products: Vec<ApiProduct> = self.get_list("/vinyl/products").await?;
        Ok(products.into_iter().map(CatalogCombination::from).collect())
    }

    async fn submit_row(&self, entry: &DraftEntry) -> AppResult<SubmittedRecord> {
        let (width, length_yards) = quantities(entry)?;

        let locked_unit = entry
            .specific_inventory_id
            .as_deref()
            .filter(|_| entry.movement_type.is_withdrawal());

        let response = match locked_unit {
            Some(unit_id) => {
                tracing::debug!("Withdrawing {} yd from unit {}", length_yards, unit_id);
                let url = format!("{}/vinyl/{}", self.base_url, unit_id);
                let body = UnitWithdrawal {
                    movement_type: entry.movement_type.as_str(),
                    length_yards,
                    notes: &entry.notes,
                };
                self.send(self.client.put(&url).json(&body)).await?
            }
            None => {
                let url = format!("{}/vinyl", self.base_url);
                let body = NewVinylRecord {
                    movement_type: entry.movement_type.as_str(),
                    brand: entry.brand.trim(),
                    series: entry.series.trim(),
                    colour_number: non_empty(&entry.colour_number),
                    colour_name: non_empty(&entry.colour_name),
                    width,
                    length_yards,
                    location: non_empty(&entry.location),
                    storage_date: entry.storage_date,
                    notes: &entry.notes,
                    job_ids: &entry.linked_job_ids,
                };
                self.send(self.client.post(&url).json(&body)).await?
            }
        };

        let record_id = match locked_unit {
            // Updates may answer with an empty body
            Some(unit_id) => Self::created_id(response)
                .await
                .unwrap_or_else(|_| unit_id.to_string()),
            None => Self::created_id(response).await?,
        };

        Ok(SubmittedRecord { record_id })
    }

    async fn update_job_links(&self, record_id: &str, job_ids: &[String]) -> AppResult<()> {
        let url = format!("{}/vinyl/{}/jobs", self.base_url, record_id);
        self.send(self.client.put(&url).json(&JobLinks { job_ids }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_colour() {
        assert_eq!(
            split_colour("057 Olympic Blue"),
            (Some("057".to_string()), Some("Olympic Blue".to_string()))
        );
        assert_eq!(split_colour("Ivory"), (None, Some("Ivory".to_string())));
        assert_eq!(split_colour("861-W"), (Some("861-W".to_string()), None));
        assert_eq!(split_colour("  "), (None, None));
        assert_eq!(
            split_colour("Dual Colour White"),
            (None, Some("Dual Colour White".to_string()))
        );
    }

    #[test]
    fn test_inventory_item_from_combined_colour() {
        let item: ApiVinylItem = serde_json::from_str(
            r#"{"id": 12, "brand": "3M", "series": "3630", "colour": "005 Ivory",
                "width": 48, "length_yards": "0.5", "disposition": "in_stock",
                "storage_date": "2025-03-01"}"#,
        )
        .unwrap();
        let unit = InventoryUnit::from(item);
        assert_eq!(unit.id, "12");
        assert_eq!(unit.colour_number(), "005");
        assert_eq!(unit.colour_name(), "Ivory");
        assert!(unit.is_on_hand());
    }

    #[test]
    fn test_explicit_colour_fields_win() {
        let item: ApiVinylItem = serde_json::from_str(
            r#"{"id": "a1", "brand": "3M", "series": "3630", "colour_number": "015",
                "colour_name": "Yellow", "colour": "005 Ivory",
                "width": "24", "length_yards": 3, "disposition": "used"}"#,
        )
        .unwrap();
        let unit = InventoryUnit::from(item);
        assert_eq!(unit.colour_number(), "015");
        assert_eq!(unit.colour_name(), "Yellow");
        assert_eq!(unit.disposition, Disposition::Used);
    }

    #[test]
    fn test_wrapped_listing() {
        let list: ApiList<ApiProduct> = serde_json::from_str(
            r#"{"data": [{"brand": "3M", "series": "3630", "colour_number": "005"}]}"#,
        )
        .unwrap();
        let products = list.into_vec();
        assert_eq!(products.len(), 1);
        let combo = CatalogCombination::from(products.into_iter().next().unwrap());
        assert_eq!(combo.colour_number(), "005");
        assert_eq!(combo.default_width, None);
    }

    #[test]
    fn test_created_id_shapes() {
        let bare: ApiCreated = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(bare.into_id(), "7");
        let wrapped: ApiCreated = serde_json::from_str(r#"{"data": {"id": "v-9"}}"#).unwrap();
        assert_eq!(wrapped.into_id(), "v-9");
    }

    #[test]
    fn test_new_record_body_omits_empty_fields() {
        let body = NewVinylRecord {
            movement_type: "store",
            brand: "3M",
            series: "3630",
            colour_number: Some("005"),
            colour_name: None,
            width: Decimal::from(48),
            length_yards: Decimal::from(2),
            location: None,
            storage_date: None,
            notes: "Storage: ",
            job_ids: &[],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "store");
        assert!(json.get("colour_name").is_none());
        assert!(json.get("storage_date").is_none());
        assert!(json.get("job_ids").is_none());
    }

    #[test]
    fn test_new_record_body_carries_storage_date() {
        let body = NewVinylRecord {
            movement_type: "store",
            brand: "3M",
            series: "3630",
            colour_number: Some("005"),
            colour_name: Some("Ivory"),
            width: Decimal::from(48),
            length_yards: Decimal::from(2),
            location: Some("Storage"),
            storage_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            notes: "Storage: Imported from inventory list 2025-03-01",
            job_ids: &[],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["storage_date"], "2025-03-01");
    }
}
