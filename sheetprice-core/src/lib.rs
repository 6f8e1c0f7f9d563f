//! sheetprice-core: import spreadsheet price lists into a product catalog
//!
//! A worksheet is read with calamine, its header row is mapped to the
//! required columns, and each data row is matched to a catalog variant by
//! product name and variant value before its prices are written.

pub mod checkpoint;
pub mod config;
pub mod connection;
pub mod error;
pub mod export;
pub mod header;
pub mod logging;
pub mod reader;
pub mod reconcile;
pub mod record;
pub mod store;

pub use checkpoint::Checkpoint;
pub use config::{ColumnLayout, ColumnNames, ImportConfig, NullPricePolicy};
pub use connection::ConnectionSettings;
pub use error::{ConfigError, Error, Result, StoreError};
pub use header::HeaderMap;
pub use reader::{CellValue, Table, read_table};
pub use reconcile::{CheckpointTarget, ReconcileOptions, Reconciler, RowEvent, RunSummary};
pub use record::{PriceRecord, PriceSet};
pub use store::{CatalogStore, InMemoryCatalog, Lookup, MySqlCatalog, VariantMatch};
