pub mod audit;
pub mod checker;
pub mod config;
pub mod constraint;
pub mod error;
pub mod lockfile;
pub mod model;
pub mod ops;
pub mod output;

pub use config::Config;
pub use constraint::{ConstraintTable, VersionConstraint};
pub use error::{Error, Result};
pub use model::{Hit, Inventory, NearMiss, ScanSummary};
