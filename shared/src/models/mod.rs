//! Domain models for bulk inventory entry

mod entry;
mod inventory;

pub use entry::*;
pub use inventory::*;
