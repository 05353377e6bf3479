//! Catalog sync entry point.

use catalog_bridge_core::{ErpModuleRecord, ErpProductRecord};
use futures::Stream;

use crate::bulk::{BatchSummary, BulkImportOrchestrator, ImportOutcome};
use crate::config::ErpConfig;
use crate::erp::{CatalogReader, ErpClient, ErpError};
use crate::error::ImportError;
use crate::storefront::ProductStore;
use crate::upsert::{ImportedProduct, ProductUpsertService};

/// The operations a caller (CLI, admin page, job runner) needs.
///
/// Owns one [`ErpClient`], so every operation shares a single authentication.
#[derive(Debug)]
pub struct CatalogSync<S> {
    reader: CatalogReader,
    upsert: ProductUpsertService<S>,
}

impl<S: ProductStore> CatalogSync<S> {
    /// Build from an existing client.
    #[must_use]
    pub fn new(client: ErpClient, store: S) -> Self {
        let reader = CatalogReader::new(client);
        let upsert = ProductUpsertService::new(reader.clone(), store);
        Self { reader, upsert }
    }

    /// Build a client from `config` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::Http` if the HTTP client cannot be built.
    pub fn connect(config: ErpConfig, store: S) -> Result<Self, ErpError> {
        Ok(Self::new(ErpClient::new(config)?, store))
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        self.upsert.store()
    }

    /// List ERP products, `limit` defaulting to the configured product limit.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::NotAuthenticated` if the credentials are rejected,
    /// or another `ErpError` on fault or transport failure.
    pub async fn list_erp_products(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<ErpProductRecord>, ErpError> {
        let limit = limit.unwrap_or_else(|| self.reader.client().config().product_limit());
        self.reader.list_products(limit).await
    }

    /// List installed ERP modules, `limit` defaulting to the configured module limit.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogSync::list_erp_products`].
    pub async fn list_erp_modules(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<ErpModuleRecord>, ErpError> {
        let limit = limit.unwrap_or_else(|| self.reader.client().config().module_limit());
        self.reader.list_modules(limit).await
    }

    /// Import one ERP product. See [`ProductUpsertService::import_product`].
    ///
    /// # Errors
    ///
    /// See [`ProductUpsertService::import_product`].
    pub async fn import_product(&self, erp_id: i64) -> Result<ImportedProduct, ImportError> {
        self.upsert.import_product(erp_id).await
    }

    /// Start a bulk import. See [`BulkImportOrchestrator::run`].
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Authentication` before any item is attempted if
    /// the credentials are rejected.
    pub async fn run_bulk_import(
        &self,
        erp_ids: Vec<i64>,
    ) -> Result<impl Stream<Item = ImportOutcome> + '_, ImportError> {
        BulkImportOrchestrator::new(&self.upsert).run(erp_ids).await
    }

    /// Run a bulk import to the end. See [`BulkImportOrchestrator::run_to_completion`].
    ///
    /// # Errors
    ///
    /// Same as [`CatalogSync::run_bulk_import`].
    pub async fn run_bulk_import_to_completion<F>(
        &self,
        erp_ids: Vec<i64>,
        on_outcome: F,
    ) -> Result<BatchSummary, ImportError>
    where
        F: FnMut(&ImportOutcome),
    {
        BulkImportOrchestrator::new(&self.upsert)
            .run_to_completion(erp_ids, on_outcome)
            .await
    }
}
