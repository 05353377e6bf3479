//! Idempotent import of one ERP product into the storefront.
//!
//! An import reads the product from the ERP, finds the storefront product
//! linked to it (if any), overwrites the synced fields, saves, and links a
//! newly created product to its ERP id. Importing the same id twice updates
//! the same storefront product.

use catalog_bridge_core::{
    CatalogVisibility, ErpId, ErpProductRecord, PublicationStatus, StockStatus,
    StorefrontProduct, StorefrontProductId,
};
use serde::Serialize;
use tracing::instrument;

use crate::erp::CatalogReader;
use crate::error::ImportError;
use crate::storefront::ProductStore;

/// Whether an import created a storefront product or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertAction {
    Created,
    Updated,
}

impl std::fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

/// Result of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportedProduct {
    pub erp_id: ErpId,
    pub storefront_id: StorefrontProductId,
    pub action: UpsertAction,
}

/// Apply an ERP record to a storefront product.
///
/// Starts from `existing` (or a fresh draft) and overwrites name, price and
/// publication fields. The description is only replaced when the ERP has a
/// non-empty one. The ERP link is not touched; it is written separately after
/// the first save.
#[must_use]
pub fn reconcile(
    existing: Option<StorefrontProduct>,
    incoming: &ErpProductRecord,
) -> StorefrontProduct {
    let mut product = existing.unwrap_or_else(StorefrontProduct::new_draft);

    product.name.clone_from(&incoming.name);
    product.regular_price = incoming.price;
    if let Some(description) = incoming.description.as_deref().filter(|d| !d.is_empty()) {
        product.description = Some(description.to_string());
    }
    product.status = PublicationStatus::Publish;
    product.visibility = CatalogVisibility::Visible;
    product.stock_status = StockStatus::InStock;

    product
}

/// Imports ERP products into a [`ProductStore`].
#[derive(Debug)]
pub struct ProductUpsertService<S> {
    reader: CatalogReader,
    store: S,
}

impl<S: ProductStore> ProductUpsertService<S> {
    /// Create a new service.
    #[must_use]
    pub const fn new(reader: CatalogReader, store: S) -> Self {
        Self { reader, store }
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Fail fast if the ERP rejects the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Authentication` if the credentials were rejected
    /// or the authentication call failed.
    pub async fn ensure_authenticated(&self) -> Result<(), ImportError> {
        self.reader.client().session().await?;
        Ok(())
    }

    /// Import one ERP product.
    ///
    /// Creates the storefront product on first import and updates it on every
    /// later one.
    ///
    /// # Errors
    ///
    /// - `ImportError::InvalidArgument` if `erp_id` is not positive (no network call is made)
    /// - `ImportError::NotFound` if the ERP has no such product
    /// - `ImportError::Authentication`, `Fault` or `Transport` on ERP failures
    /// - `ImportError::Persistence` if the storefront read or write fails
    #[instrument(skip(self))]
    pub async fn import_product(&self, erp_id: i64) -> Result<ImportedProduct, ImportError> {
        let erp_id = ErpId::new(erp_id);
        if !erp_id.is_positive() {
            return Err(ImportError::InvalidArgument(erp_id.as_i64()));
        }

        let incoming = self
            .reader
            .read_product(erp_id)
            .await?
            .ok_or(ImportError::NotFound(erp_id))?;

        let existing = self.store.find_by_external_id(erp_id).await?;
        let action = if existing.is_some() {
            UpsertAction::Updated
        } else {
            UpsertAction::Created
        };

        let product = reconcile(existing, &incoming);
        let storefront_id = self.store.save(&product).await?;

        if action == UpsertAction::Created {
            self.store.set_external_id(storefront_id, erp_id).await?;
        }

        tracing::info!(
            %erp_id,
            %storefront_id,
            %action,
            name = %product.name,
            "Imported ERP product"
        );

        Ok(ImportedProduct {
            erp_id,
            storefront_id,
            action,
        })
    }
}
