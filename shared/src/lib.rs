//! Shared types and engine for vinyl inventory bulk entry
//!
//! Everything here is synchronous and pure so it can run in the backend,
//! in the browser (via WASM), and in tests without a runtime.

pub mod allocation;
pub mod cascade;
pub mod colour;
pub mod import;
pub mod models;
pub mod suggest;
pub mod types;
pub mod validation;

pub use allocation::*;
pub use cascade::*;
pub use colour::*;
pub use import::*;
pub use models::*;
pub use suggest::*;
pub use types::*;
pub use validation::*;
