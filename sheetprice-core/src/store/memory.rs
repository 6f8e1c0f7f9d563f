//! In-memory catalog with transaction semantics

use super::{CatalogStore, Lookup, VariantMatch};
use crate::config::NullPricePolicy;
use crate::error::StoreError;
use crate::record::PriceSet;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogVariant {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub variant_value: String,
    pub prices: PriceSet,
}

/// A call issued against the store, recorded in order
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Find {
        product_name: String,
        variant_value: String,
    },
    Update {
        variant_id: String,
        prices: PriceSet,
    },
    Commit,
    Rollback,
    Close,
}

/// Catalog kept in memory. Updates land in a working copy until committed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    committed: Vec<CatalogVariant>,
    working: Vec<CatalogVariant>,
    calls: Vec<StoreCall>,
    fail_on: Option<(String, String)>,
    closed: bool,
}

impl InMemoryCatalog {
    pub fn new(variants: Vec<CatalogVariant>) -> Self {
        Self {
            committed: variants.clone(),
            working: variants,
            ..Default::default()
        }
    }

    /// Add a variant to both the committed and working state
    pub fn with_variant(
        mut self,
        id: &str,
        product_name: &str,
        variant_value: &str,
        prices: PriceSet,
    ) -> Self {
        let variant = CatalogVariant {
            id: id.to_string(),
            product_id: format!("product-{product_name}"),
            product_name: product_name.to_string(),
            variant_value: variant_value.to_string(),
            prices,
        };
        self.committed.push(variant.clone());
        self.working.push(variant);
        self
    }

    /// Make lookups of this key fail with a backend error
    pub fn fail_on(mut self, product_name: &str, variant_value: &str) -> Self {
        self.fail_on = Some((product_name.to_string(), variant_value.to_string()));
        self
    }

    /// Committed state
    pub fn variants(&self) -> &[CatalogVariant] {
        &self.committed
    }

    pub fn variant(&self, id: &str) -> Option<&CatalogVariant> {
        self.committed.iter().find(|v| v.id == id)
    }

    pub fn calls(&self) -> &[StoreCall] {
        &self.calls
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of find and update statements issued
    pub fn statement_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Find { .. } | StoreCall::Update { .. }))
            .count()
    }

    pub fn update_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Update { .. }))
            .count()
    }
}

impl CatalogStore for InMemoryCatalog {
    async fn find_variant(
        &mut self,
        product_name: &str,
        variant_value: &str,
    ) -> Result<Lookup, StoreError> {
        self.calls.push(StoreCall::Find {
            product_name: product_name.to_string(),
            variant_value: variant_value.to_string(),
        });

        if let Some((name, value)) = &self.fail_on {
            if name == product_name && value == variant_value {
                return Err(StoreError::Backend(format!(
                    "lookup failed for {product_name} - {variant_value}"
                )));
            }
        }

        let matches = self
            .working
            .iter()
            .filter(|v| v.product_name == product_name && v.variant_value == variant_value)
            .map(|v| VariantMatch {
                variant_id: v.id.clone(),
                product_id: v.product_id.clone(),
                product_name: v.product_name.clone(),
            })
            .collect();
        Ok(Lookup::from_matches(matches))
    }

    async fn update_prices(
        &mut self,
        variant_id: &str,
        prices: &PriceSet,
        policy: NullPricePolicy,
    ) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Update {
            variant_id: variant_id.to_string(),
            prices: *prices,
        });

        for variant in self.working.iter_mut().filter(|v| v.id == variant_id) {
            variant.prices = match policy {
                NullPricePolicy::Overwrite => *prices,
                NullPricePolicy::Keep => PriceSet {
                    city: prices.city.or(variant.prices.city),
                    interior: prices.interior.or(variant.prices.interior),
                    special: prices.special.or(variant.prices.special),
                },
            };
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Commit);
        self.committed = self.working.clone();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Rollback);
        self.working = self.committed.clone();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Close);
        self.working = self.committed.clone();
        self.closed = true;
        Ok(())
    }
}
