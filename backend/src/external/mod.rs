//! External API integrations

pub mod gateway;
pub mod inventory_api;

pub use gateway::{InventoryGateway, SubmittedRecord};
pub use inventory_api::InventoryApiClient;
