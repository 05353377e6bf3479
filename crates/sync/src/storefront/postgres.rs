//! `PostgreSQL` product store.
//!
//! Queries are checked at runtime (not with `query!` macros) so the crate
//! builds without a live database.

use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

use catalog_bridge_core::{
    CatalogVisibility, ErpId, Price, PublicationStatus, StockStatus, StorefrontProduct,
    StorefrontProductId,
};

use super::{EXTERNAL_ID_META_KEY, ProductStore, StoreError};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

const SELECT_PRODUCT: &str = r"
    SELECT p.id, p.name, p.regular_price, p.description,
           p.status, p.visibility, p.stock_status, p.updated_at,
           m.meta_value AS external_id
    FROM storefront.product p
";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: StorefrontProductId,
    name: String,
    regular_price: Price,
    description: Option<String>,
    status: PublicationStatus,
    visibility: CatalogVisibility,
    stock_status: StockStatus,
    updated_at: DateTime<Utc>,
    external_id: Option<String>,
}

impl TryFrom<ProductRow> for StorefrontProduct {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let external_id = row
            .external_id
            .map(|raw| {
                raw.trim().parse::<i64>().map(ErpId::new).map_err(|_| {
                    StoreError::DataCorruption(format!(
                        "product {} has non-numeric {EXTERNAL_ID_META_KEY}: {raw:?}",
                        row.id
                    ))
                })
            })
            .transpose()?;

        Ok(Self {
            id: Some(row.id),
            name: row.name,
            regular_price: row.regular_price,
            description: row.description,
            status: row.status,
            visibility: row.visibility,
            stock_status: row.stock_status,
            external_id,
            updated_at: Some(row.updated_at),
        })
    }
}

/// Product store backed by the storefront database.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a new store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ProductStore for PgProductStore {
    #[instrument(skip(self), fields(erp_id = %erp_id))]
    async fn find_by_external_id(
        &self,
        erp_id: ErpId,
    ) -> Result<Option<StorefrontProduct>, StoreError> {
        let sql = format!(
            "{SELECT_PRODUCT}
             JOIN storefront.product_meta m
               ON m.product_id = p.id AND m.meta_key = $1
             WHERE m.meta_value = $2
             ORDER BY p.id
             LIMIT 2"
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(EXTERNAL_ID_META_KEY)
            .bind(erp_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        if rows.len() > 1 {
            tracing::warn!("Several storefront products linked to one ERP product, using lowest id");
        }

        rows.into_iter()
            .next()
            .map(StorefrontProduct::try_from)
            .transpose()
    }

    #[instrument(skip(self, product), fields(id = ?product.id))]
    async fn save(&self, product: &StorefrontProduct) -> Result<StorefrontProductId, StoreError> {
        match product.id {
            Some(id) => {
                let updated: Option<StorefrontProductId> = sqlx::query_scalar(
                    r"
                    UPDATE storefront.product
                    SET name = $2, regular_price = $3, description = $4,
                        status = $5, visibility = $6, stock_status = $7,
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING id
                    ",
                )
                .bind(id)
                .bind(&product.name)
                .bind(product.regular_price)
                .bind(product.description.as_deref())
                .bind(product.status)
                .bind(product.visibility)
                .bind(product.stock_status)
                .fetch_optional(&self.pool)
                .await?;

                updated.ok_or(StoreError::NotFound(id))
            }
            None => {
                let id: StorefrontProductId = sqlx::query_scalar(
                    r"
                    INSERT INTO storefront.product
                        (name, regular_price, description, status, visibility, stock_status)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id
                    ",
                )
                .bind(&product.name)
                .bind(product.regular_price)
                .bind(product.description.as_deref())
                .bind(product.status)
                .bind(product.visibility)
                .bind(product.stock_status)
                .fetch_one(&self.pool)
                .await?;

                Ok(id)
            }
        }
    }

    #[instrument(skip(self), fields(id = %id, erp_id = %erp_id))]
    async fn set_external_id(
        &self,
        id: StorefrontProductId,
        erp_id: ErpId,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO storefront.product_meta (product_id, meta_key, meta_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, meta_key) DO UPDATE SET meta_value = EXCLUDED.meta_value
            ",
        )
        .bind(id)
        .bind(EXTERNAL_ID_META_KEY)
        .bind(erp_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
