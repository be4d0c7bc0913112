//! Core data types for inventories, hits, and scan summaries.

mod inventory;
mod report;

pub use inventory::*;
pub use report::*;
