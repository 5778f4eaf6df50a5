//! Vinyl inventory entry - async runtime side
//!
//! Owns the draft row list, talks to the inventory API and runs batch
//! submissions. The pure engine lives in the `shared` crate.

pub mod config;
pub mod error;
pub mod external;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
