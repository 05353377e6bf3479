//! Catalog Bridge sync library.
//!
//! Reads products and modules from an Odoo-style ERP over JSON-RPC and
//! upserts products into the storefront catalog, linking each storefront
//! product to its ERP id so repeated imports update instead of duplicating.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration with placeholder/entropy checks
//! - [`erp`] - JSON-RPC transport, authentication cache, catalog queries
//! - [`storefront`] - `ProductStore` trait with `PostgreSQL` and in-memory stores
//! - [`upsert`] - Single-product import and the pure `reconcile` mapping
//! - [`bulk`] - Sequential bulk import with per-item outcomes
//! - [`service`] - [`CatalogSync`], the entry point for callers
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_bridge_sync::{CatalogSync, SyncConfig, storefront::MemoryProductStore};
//!
//! let config = SyncConfig::from_env()?;
//! let sync = CatalogSync::connect(config.erp, MemoryProductStore::new())?;
//!
//! for product in sync.list_erp_products(None).await? {
//!     let imported = sync.import_product(product.erp_id.as_i64()).await?;
//!     tracing::info!(storefront_id = %imported.storefront_id, "imported");
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bulk;
pub mod config;
pub mod erp;
pub mod error;
pub mod service;
pub mod storefront;
pub mod upsert;

pub use bulk::{BatchSummary, BulkImportOrchestrator, ImportOutcome};
pub use config::{ConfigError, ErpConfig, SyncConfig, TelemetryConfig};
pub use error::{ImportError, ImportErrorKind};
pub use service::CatalogSync;
pub use upsert::{ImportedProduct, ProductUpsertService, UpsertAction, reconcile};
