//! MySQL catalog backed by sqlx

use super::{CatalogStore, Lookup, VariantMatch};
use crate::config::NullPricePolicy;
use crate::connection::ConnectionSettings;
use crate::error::StoreError;
use crate::record::PriceSet;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::{MySql, Transaction};

const FIND_VARIANT: &str = "SELECT pv.id, p.id, p.name \
     FROM productVariants pv \
     JOIN products p ON pv.productId = p.id \
     WHERE p.name = ? AND pv.variantValue = ?";

const UPDATE_PRICES: &str = "UPDATE productVariants \
     SET precioCiudad = ?, precioInterior = ?, precioEspecial = ? \
     WHERE id = ?";

const UPDATE_PRICES_KEEP_NULLS: &str = "UPDATE productVariants \
     SET precioCiudad = COALESCE(?, precioCiudad), \
         precioInterior = COALESCE(?, precioInterior), \
         precioEspecial = COALESCE(?, precioEspecial) \
     WHERE id = ?";

/// Product catalog in a MySQL database, using a single connection
pub struct MySqlCatalog {
    pool: MySqlPool,
    tx: Option<Transaction<'static, MySql>>,
}

impl MySqlCatalog {
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self, StoreError> {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        tracing::info!(database = %settings, "connected to catalog");
        Ok(Self { pool, tx: None })
    }

    /// Current transaction, opened on first use
    async fn transaction(&mut self) -> Result<&mut Transaction<'static, MySql>, StoreError> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.pool.begin().await?,
        };
        Ok(self.tx.insert(tx))
    }
}

impl CatalogStore for MySqlCatalog {
    async fn find_variant(
        &mut self,
        product_name: &str,
        variant_value: &str,
    ) -> Result<Lookup, StoreError> {
        let tx = self.transaction().await?;
        let rows: Vec<(String, String, String)> = sqlx::query_as(FIND_VARIANT)
            .bind(product_name)
            .bind(variant_value)
            .fetch_all(&mut **tx)
            .await?;

        let matches = rows
            .into_iter()
            .map(|(variant_id, product_id, product_name)| VariantMatch {
                variant_id,
                product_id,
                product_name,
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
        let sql = match policy {
            NullPricePolicy::Overwrite => UPDATE_PRICES,
            NullPricePolicy::Keep => UPDATE_PRICES_KEEP_NULLS,
        };
        let tx = self.transaction().await?;
        sqlx::query(sql)
            .bind(prices.city)
            .bind(prices.interior)
            .bind(prices.special)
            .bind(variant_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        let result = self.rollback().await;
        self.pool.close().await;
        result
    }
}
