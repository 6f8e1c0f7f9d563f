//! Catalog persistence

pub mod memory;
pub mod mysql;

pub use memory::InMemoryCatalog;
pub use mysql::MySqlCatalog;

use crate::config::NullPricePolicy;
use crate::error::StoreError;
use crate::record::PriceSet;

/// A product variant matched by product name and variant value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantMatch {
    pub variant_id: String,
    pub product_id: String,
    pub product_name: String,
}

/// Result of a keyed variant lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(VariantMatch),
    NotFound,
    /// More than one variant shares the key
    Ambiguous(usize),
}

impl Lookup {
    /// Collapse query results into a lookup outcome
    pub fn from_matches(mut matches: Vec<VariantMatch>) -> Self {
        match matches.len() {
            0 => Lookup::NotFound,
            1 => matches.pop().map_or(Lookup::NotFound, Lookup::Found),
            n => Lookup::Ambiguous(n),
        }
    }
}

/// Keyed lookup and update of product variants inside a transaction.
///
/// Statements issued after a `commit` or `rollback` start a new transaction.
#[allow(async_fn_in_trait)]
pub trait CatalogStore {
    /// Find variants whose product name and variant value match exactly
    async fn find_variant(&mut self, product_name: &str, variant_value: &str)
    -> Result<Lookup, StoreError>;

    /// Write the three prices of a variant
    async fn update_prices(
        &mut self,
        variant_id: &str,
        prices: &PriceSet,
        policy: NullPricePolicy,
    ) -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;

    /// Release the connection. Uncommitted work is discarded.
    async fn close(&mut self) -> Result<(), StoreError>;
}
