//! Catalog records on both sides of the sync.
//!
//! ERP records are read-only snapshots; the sync never writes back to the ERP.
//! [`StorefrontProduct`] is the in-memory shape of a storefront product that the
//! persistence layer loads and saves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ErpId, StorefrontProductId};
use super::price::Price;
use super::status::{CatalogVisibility, ModuleState, PublicationStatus, StockStatus};

/// A product template as read from the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErpProductRecord {
    pub erp_id: ErpId,
    pub name: String,
    /// `list_price` on the ERP side.
    pub price: Price,
    /// Internal reference (`default_code`), only present in listings.
    pub sku: Option<String>,
    /// Sales description (`description_sale`), only present on full reads.
    pub description: Option<String>,
}

/// An installed ERP module. Display-only, no storefront counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErpModuleRecord {
    /// Technical name (e.g. `sale_management`).
    pub name: String,
    pub short_description: Option<String>,
    pub author: Option<String>,
    pub state: ModuleState,
}

/// A storefront product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontProduct {
    /// Assigned by the store on first save; `None` for a product not yet created.
    pub id: Option<StorefrontProductId>,
    pub name: String,
    pub regular_price: Price,
    pub description: Option<String>,
    pub status: PublicationStatus,
    pub visibility: CatalogVisibility,
    pub stock_status: StockStatus,
    /// ERP id this product was imported from, stored as product metadata.
    pub external_id: Option<ErpId>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StorefrontProduct {
    /// A blank, unsaved product with storefront defaults (draft, visible, in stock).
    #[must_use]
    pub fn new_draft() -> Self {
        Self {
            id: None,
            name: String::new(),
            regular_price: Price::ZERO,
            description: None,
            status: PublicationStatus::default(),
            visibility: CatalogVisibility::default(),
            stock_status: StockStatus::default(),
            external_id: None,
            updated_at: None,
        }
    }

    /// Whether this product has been persisted yet.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

impl Default for StorefrontProduct {
    fn default() -> Self {
        Self::new_draft()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft_defaults() {
        let product = StorefrontProduct::new_draft();
        assert!(product.is_new());
        assert_eq!(product.status, PublicationStatus::Draft);
        assert_eq!(product.visibility, CatalogVisibility::Visible);
        assert_eq!(product.stock_status, StockStatus::InStock);
        assert_eq!(product.regular_price, Price::ZERO);
        assert!(product.external_id.is_none());
    }
}
