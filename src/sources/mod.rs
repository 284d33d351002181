//! Collaborators that feed the pipeline: raw readings and the equipment catalog.

pub mod catalog;
pub mod models;
pub mod parquet_reads;
pub mod readings;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;
use crate::pipeline::{CatalogEntry, Reading};

pub use catalog::SqlCatalogSource;
pub use readings::PartitionedReadingSource;

/// Supplies every reading recorded on a target date.
///
/// Implementations return sensor ids uppercased and readings sorted by
/// ascending timestamp.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn fetch_readings(&self, date: NaiveDate) -> AppResult<Vec<Reading>>;
}

/// Supplies the full equipment catalog, fetched fresh on every call.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> AppResult<Vec<CatalogEntry>>;
}
