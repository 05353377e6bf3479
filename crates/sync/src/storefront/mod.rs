//! Storefront product persistence.
//!
//! # Database: storefront `PostgreSQL`
//!
//! ## Tables
//!
//! - `storefront.product` - Product records (name, price, description, statuses)
//! - `storefront.product_meta` - Key/value metadata; the ERP link lives under
//!   [`EXTERNAL_ID_META_KEY`]
//!
//! # Migrations
//!
//! Migrations are stored in `crates/sync/migrations/` and run via:
//! ```bash
//! cargo run -p catalog-bridge-cli -- migrate
//! ```
//!
//! [`MemoryProductStore`] implements the same contract in memory for tests and
//! dry runs.

pub mod memory;
pub mod postgres;

pub use memory::MemoryProductStore;
pub use postgres::{PgProductStore, create_pool};

use catalog_bridge_core::{ErpId, StorefrontProduct, StorefrontProductId};
use thiserror::Error;

/// Metadata key linking a storefront product to its ERP product.
pub const EXTERNAL_ID_META_KEY: &str = "_erp_id";

/// Errors that can occur during storefront persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// An update targeted a product that does not exist.
    #[error("storefront product {0} not found")]
    NotFound(StorefrontProductId),

    /// The store refused the write.
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Storefront product persistence.
///
/// `save` writes product fields only. The ERP link is written separately with
/// `set_external_id`, so a failed save never leaves a dangling link.
pub trait ProductStore: Send + Sync {
    /// Find the product linked to `erp_id`.
    ///
    /// If several products carry the same link, the one with the lowest
    /// storefront id wins.
    fn find_by_external_id(
        &self,
        erp_id: ErpId,
    ) -> impl Future<Output = Result<Option<StorefrontProduct>, StoreError>> + Send;

    /// Insert (when `product.id` is `None`) or update a product.
    ///
    /// Returns the storefront id of the written product.
    fn save(
        &self,
        product: &StorefrontProduct,
    ) -> impl Future<Output = Result<StorefrontProductId, StoreError>> + Send;

    /// Link a product to an ERP id, replacing any previous link.
    fn set_external_id(
        &self,
        id: StorefrontProductId,
        erp_id: ErpId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
